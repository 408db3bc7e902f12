//! Implicit conversions and the `Dynamic` box.
//!
//! A `Dynamic` value points at a heap box `talon.Dynamic[T]` whose first
//! field is the `%Dynamic` header (the address of `T`'s runtime `Type`
//! record) and whose second field is the payload. Runtime type tests
//! compare record addresses, since every type has exactly one record.

use inkwell::IntPredicate;
use talon_diagnostic::{CompileError, CompileResult};
use talon_types::{Conversion, Idx};

use super::function_visitor::FunctionVisitor;
use super::value_id::ValueId;

impl FunctionVisitor<'_, '_, '_> {
    /// Pass `value` of type `from` where a `to` is expected.
    pub(crate) fn convert(&mut self, value: ValueId, from: Idx, to: Idx) -> CompileResult<ValueId> {
        let Some(conversion) = self.gen.pool.conversion(from, to) else {
            return Err(CompileError::type_mismatch(format!(
                "unable to convert a '{}' to a '{}'",
                self.gen.show(from),
                self.gen.show(to)
            )));
        };
        match conversion {
            Conversion::Identity => Ok(value),
            Conversion::WidenBool => {
                let i32_ty = self.gen.cx.builder.i32_type();
                Ok(self.gen.cx.builder.zext(value, i32_ty, "widen"))
            }
            Conversion::CastClosure => {
                let ptr = self.gen.cx.builder.ptr_type();
                Ok(self.gen.cx.builder.bitcast(value, ptr, "closure.cast"))
            }
            Conversion::WrapDynamic => self.box_dynamic(value, from),
        }
    }

    /// Box `value` of type `ty` together with its runtime type record.
    pub(crate) fn box_dynamic(&mut self, value: ValueId, ty: Idx) -> CompileResult<ValueId> {
        let layout = self.gen.dynamic_layout(ty)?;
        let header_layout = self.gen.layout(Idx::DYNAMIC)?;
        let record = self.gen.runtime_type(ty)?;
        let boxed = self.allocate(layout, false, "dynamic")?;

        let builder = &mut self.gen.cx.builder;
        let header = builder.struct_gep(layout, boxed, 0, "dynamic.header");
        let type_slot = builder.struct_gep(header_layout, header, 0, "dynamic.type");
        builder.store(record, type_slot);
        let payload = builder.struct_gep(layout, boxed, 1, "dynamic.value");
        builder.store(value, payload);
        Ok(boxed)
    }

    /// `i1` telling whether the box `boxed` holds a `ty`.
    pub(crate) fn dynamic_holds(&mut self, boxed: ValueId, ty: Idx) -> CompileResult<ValueId> {
        let header_layout = self.gen.layout(Idx::DYNAMIC)?;
        let record = self.gen.runtime_type(ty)?;
        let builder = &mut self.gen.cx.builder;
        let ptr = builder.ptr_type();
        let type_slot = builder.struct_gep(header_layout, boxed, 0, "type.ptr");
        let held = builder.load(ptr, type_slot, "type");
        Ok(builder.icmp_ptr(IntPredicate::EQ, held, record, "holds"))
    }

    /// The payload of a box known to hold a `ty`.
    pub(crate) fn unbox_dynamic(&mut self, boxed: ValueId, ty: Idx) -> CompileResult<ValueId> {
        let layout = self.gen.dynamic_layout(ty)?;
        let value_ty = self.gen.value_type(ty)?;
        let builder = &mut self.gen.cx.builder;
        let slot = builder.struct_gep(layout, boxed, 1, "payload.ptr");
        Ok(builder.load(value_ty, slot, "payload"))
    }
}
