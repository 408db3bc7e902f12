//! Memory operations (alloca, load, store, GEP) for `IrBuilder`.

use inkwell::types::BasicTypeEnum;

use super::IrBuilder;
use crate::codegen::value_id::{FunctionId, LLVMTypeId, ValueId};

impl IrBuilder<'_> {
    /// Build an alloca at the top of `function`'s entry block, so every
    /// local has one slot per call wherever it is declared.
    pub fn create_entry_alloca(
        &mut self,
        function: FunctionId,
        name: &str,
        ty: LLVMTypeId,
    ) -> ValueId {
        let func_val = self.arena.get_function(function);
        let llvm_ty = self.arena.get_type(ty);

        let Some(entry) = func_val.get_first_basic_block() else {
            tracing::error!("entry alloca requested in a function without blocks");
            self.record_codegen_error();
            return self.const_null();
        };

        if let Some(first_instr) = entry.get_first_instruction() {
            self.builder.position_before(&first_instr);
        } else {
            self.builder.position_at_end(entry);
        }

        let ptr = self.builder.build_alloca(llvm_ty, name).expect("alloca");

        if let Some(block_id) = self.current_block {
            let bb = self.arena.get_block(block_id);
            self.builder.position_at_end(bb);
        }

        self.arena.push_value(ptr.into())
    }

    /// Build a load of a `ty` from `ptr`.
    ///
    /// Defensive: a non-pointer `ptr` records a codegen error and yields
    /// `ptr` itself.
    pub fn load(&mut self, ty: LLVMTypeId, ptr: ValueId, name: &str) -> ValueId {
        let llvm_ty = self.arena.get_type(ty);
        let raw = self.arena.get_value(ptr);
        if !raw.is_pointer_value() {
            tracing::error!(val_type = ?raw.get_type(), "load from non-pointer");
            self.record_codegen_error();
            return ptr;
        }
        let v = self
            .builder
            .build_load(llvm_ty, raw.into_pointer_value(), name)
            .expect("load");
        self.arena.push_value(v)
    }

    /// Build a store of `val` to `ptr`.
    pub fn store(&mut self, val: ValueId, ptr: ValueId) {
        let v = self.arena.get_value(val);
        let raw = self.arena.get_value(ptr);
        if !raw.is_pointer_value() {
            tracing::error!(val_type = ?raw.get_type(), "store to non-pointer");
            self.record_codegen_error();
            return;
        }
        self.builder
            .build_store(raw.into_pointer_value(), v)
            .expect("store");
    }

    /// Address of field `index` of the `ty` struct at `ptr`.
    ///
    /// Defensive: a non-struct `ty`, a non-pointer `ptr` or an index past
    /// the last field records a codegen error and yields a null pointer.
    pub fn struct_gep(&mut self, ty: LLVMTypeId, ptr: ValueId, index: u32, name: &str) -> ValueId {
        let llvm_ty = self.arena.get_type(ty);
        let raw = self.arena.get_value(ptr);
        let BasicTypeEnum::StructType(st) = llvm_ty else {
            tracing::error!(?llvm_ty, "struct_gep on non-struct type");
            self.record_codegen_error();
            return self.const_null();
        };
        if !raw.is_pointer_value() || index >= st.count_fields() {
            tracing::error!(
                ty = ?st.get_name(),
                index,
                fields = st.count_fields(),
                "struct_gep out of range or on non-pointer"
            );
            self.record_codegen_error();
            return self.const_null();
        }
        let v = self
            .builder
            .build_struct_gep(st, raw.into_pointer_value(), index, name)
            .expect("struct_gep");
        self.arena.push_value(v.into())
    }
}
