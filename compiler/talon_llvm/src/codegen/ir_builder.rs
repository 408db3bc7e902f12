//! ID-based LLVM instruction builder.
//!
//! `IrBuilder` owns the [`SimpleCx`] of the module being built and wraps
//! inkwell's `Builder`. Every LLVM value it creates is stored in a
//! [`ValueArena`] and handed out as an opaque `ValueId` / `BlockId` /
//! `FunctionId` / `LLVMTypeId`, so lowering code never sees `'ctx`.
//!
//! # Method Organization
//!
//! | Category | Methods |
//! |----------|---------|
//! | Constants | `const_bool`, `const_i8`, `const_i32`, `const_i64`, `const_null`, `const_struct`, `const_string` |
//! | Memory | `create_entry_alloca`, `load`, `store`, `struct_gep` |
//! | Arithmetic | `add`, `sub`, `mul`, `sdiv`, `srem`, `shl`, `ashr`, `not` |
//! | Comparisons | `icmp`, `icmp_ptr` |
//! | Conversions | `zext`, `bitcast` |
//! | Control flow | `br`, `cond_br`, `ret`, `ret_void`, `unreachable` |
//! | Calls | `call`, `call_indirect` |
//! | Phi nodes | `phi_from_incoming` |
//! | Types | `bool_type`, `i8_type`, `i32_type`, `i64_type`, `ptr_type`, `named_struct`, ... |
//! | Blocks | `append_block`, `position_at_end`, `current_block`, ... |
//! | Functions | `declare_function`, `get_function`, `get_param`, ... |

mod control_flow;
mod instructions;
mod memory;

use std::cell::Cell;

use inkwell::builder::Builder as InkwellBuilder;
use inkwell::module::{Linkage, Module};
use inkwell::types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType};
use inkwell::values::BasicValueEnum;
use rustc_hash::FxHashMap;

use super::value_id::{BlockId, FunctionId, LLVMTypeId, ValueArena, ValueId};
use crate::context::SimpleCx;

/// Parameter and return types of a function, as arena handles.
///
/// `ret` is `None` for functions returning `void`.
#[derive(Clone, Debug)]
pub struct FunctionSig {
    pub params: Vec<LLVMTypeId>,
    pub ret: Option<LLVMTypeId>,
    pub varargs: bool,
}

/// Saved insertion point, see [`IrBuilder::save_position`].
#[derive(Clone, Copy, Debug)]
pub struct Position {
    function: Option<FunctionId>,
    block: Option<BlockId>,
}

// ---------------------------------------------------------------------------
// IrBuilder
// ---------------------------------------------------------------------------

pub struct IrBuilder<'ctx> {
    /// The underlying inkwell builder.
    builder: InkwellBuilder<'ctx>,
    /// Module, context and target layout.
    scx: SimpleCx<'ctx>,
    arena: ValueArena<'ctx>,
    /// Declared functions by symbol name, so each has one `FunctionId`.
    functions: FxHashMap<String, FunctionId>,
    /// Function the insertion point belongs to.
    current_function: Option<FunctionId>,
    /// Block new instructions are appended to.
    current_block: Option<BlockId>,
    /// Count of misuse errors during IR construction.
    ///
    /// Incremented by the defensive fallbacks (a GEP into a non-struct, a
    /// block terminated twice, ...). When > 0 the module is malformed and
    /// must not be handed to the JIT.
    codegen_errors: Cell<u32>,
}

impl<'ctx> IrBuilder<'ctx> {
    pub fn new(scx: SimpleCx<'ctx>) -> Self {
        let builder = scx.llcx.create_builder();
        Self {
            builder,
            scx,
            arena: ValueArena::new(),
            functions: FxHashMap::default(),
            current_function: None,
            current_block: None,
            codegen_errors: Cell::new(0),
        }
    }

    #[inline]
    pub fn scx(&self) -> &SimpleCx<'ctx> {
        &self.scx
    }

    #[inline]
    pub fn module(&self) -> &Module<'ctx> {
        &self.scx.llmod
    }

    pub fn into_module(self) -> Module<'ctx> {
        self.scx.llmod
    }

    pub(crate) fn record_codegen_error(&self) {
        self.codegen_errors.set(self.codegen_errors.get() + 1);
    }

    /// Number of misuse errors recorded during IR construction.
    pub fn codegen_error_count(&self) -> u32 {
        self.codegen_errors.get()
    }

    // -----------------------------------------------------------------------
    // Constants
    // -----------------------------------------------------------------------

    #[inline]
    pub fn const_bool(&mut self, val: bool) -> ValueId {
        let v = self.scx.type_i1().const_int(u64::from(val), false);
        self.arena.push_value(v.into())
    }

    #[inline]
    pub fn const_i8(&mut self, val: i8) -> ValueId {
        let v = self.scx.type_i8().const_int(val as u64, val < 0);
        self.arena.push_value(v.into())
    }

    #[inline]
    pub fn const_i32(&mut self, val: i32) -> ValueId {
        let v = self.scx.type_i32().const_int(val as u64, val < 0);
        self.arena.push_value(v.into())
    }

    #[inline]
    pub fn const_i64(&mut self, val: i64) -> ValueId {
        let v = self.scx.type_i64().const_int(val as u64, val < 0);
        self.arena.push_value(v.into())
    }

    #[inline]
    pub fn const_null(&mut self) -> ValueId {
        let v = self.scx.type_ptr().const_null();
        self.arena.push_value(v.into())
    }

    /// A constant of the named struct `ty` with the given constant fields.
    ///
    /// A non-struct `ty` records a codegen error and yields a null pointer.
    pub fn const_struct(&mut self, ty: LLVMTypeId, fields: &[ValueId]) -> ValueId {
        let BasicTypeEnum::StructType(st) = self.arena.get_type(ty) else {
            tracing::error!(ty = ?self.arena.get_type(ty), "const_struct on non-struct type");
            self.record_codegen_error();
            return self.const_null();
        };
        let values: Vec<BasicValueEnum<'ctx>> =
            fields.iter().map(|&id| self.arena.get_value(id)).collect();
        let v = st.const_named_struct(&values);
        self.arena.push_value(v.into())
    }

    /// A null-terminated `[N x i8]` constant holding `text`.
    pub fn const_string(&mut self, text: &str) -> ValueId {
        let v = self.scx.llcx.const_string(text.as_bytes(), true);
        self.arena.push_value(v.into())
    }

    // -----------------------------------------------------------------------
    // Types
    // -----------------------------------------------------------------------

    pub fn bool_type(&mut self) -> LLVMTypeId {
        let ty = self.scx.type_i1();
        self.arena.push_type(ty.into())
    }

    pub fn i8_type(&mut self) -> LLVMTypeId {
        let ty = self.scx.type_i8();
        self.arena.push_type(ty.into())
    }

    pub fn i32_type(&mut self) -> LLVMTypeId {
        let ty = self.scx.type_i32();
        self.arena.push_type(ty.into())
    }

    pub fn i64_type(&mut self) -> LLVMTypeId {
        let ty = self.scx.type_i64();
        self.arena.push_type(ty.into())
    }

    pub fn ptr_type(&mut self) -> LLVMTypeId {
        let ty = self.scx.type_ptr();
        self.arena.push_type(ty.into())
    }

    /// A new opaque named struct.
    ///
    /// Every call creates a distinct struct; LLVM suffixes the name
    /// (`Point.0`, `Point.1`, ...) when it is already taken.
    pub fn named_struct(&mut self, name: &str) -> LLVMTypeId {
        let ty = self.scx.llcx.opaque_struct_type(name);
        self.arena.push_type(ty.into())
    }

    /// Give the opaque struct `ty` its fields.
    pub fn set_struct_body(&mut self, ty: LLVMTypeId, fields: &[LLVMTypeId]) {
        let BasicTypeEnum::StructType(st) = self.arena.get_type(ty) else {
            tracing::error!(ty = ?self.arena.get_type(ty), "set_struct_body on non-struct type");
            self.record_codegen_error();
            return;
        };
        if !st.is_opaque() {
            tracing::error!(ty = ?st.get_name(), "struct body set twice");
            self.record_codegen_error();
            return;
        }
        let field_types: Vec<BasicTypeEnum<'ctx>> =
            fields.iter().map(|&id| self.arena.get_type(id)).collect();
        st.set_body(&field_types, false);
    }

    pub fn struct_has_body(&self, ty: LLVMTypeId) -> bool {
        match self.arena.get_type(ty) {
            BasicTypeEnum::StructType(st) => !st.is_opaque(),
            _ => false,
        }
    }

    /// Name LLVM gave a named struct.
    pub fn struct_name(&self, ty: LLVMTypeId) -> Option<String> {
        match self.arena.get_type(ty) {
            BasicTypeEnum::StructType(st) => st
                .get_name()
                .map(|name| name.to_string_lossy().into_owned()),
            _ => None,
        }
    }

    /// Allocation size of `ty` in bytes on the target.
    pub fn size_of(&self, ty: LLVMTypeId) -> u64 {
        self.scx.size_of(&self.arena.get_type(ty))
    }

    /// Type of an already built value.
    pub fn type_of(&mut self, val: ValueId) -> LLVMTypeId {
        let ty = self.arena.get_value(val).get_type();
        self.arena.push_type(ty)
    }

    fn fn_type(&self, sig: &FunctionSig) -> FunctionType<'ctx> {
        let params: Vec<BasicMetadataTypeEnum<'ctx>> = sig
            .params
            .iter()
            .map(|&id| self.arena.get_type(id).into())
            .collect();
        match sig.ret {
            Some(ret) => self.arena.get_type(ret).fn_type(&params, sig.varargs),
            None => self.scx.llcx.void_type().fn_type(&params, sig.varargs),
        }
    }

    // -----------------------------------------------------------------------
    // Functions and globals
    // -----------------------------------------------------------------------

    /// Declare `name` with signature `sig`, or return the existing function.
    pub fn declare_function(&mut self, name: &str, sig: &FunctionSig) -> FunctionId {
        if let Some(existing) = self.get_function(name) {
            return existing;
        }
        let fn_type = self.fn_type(sig);
        let func = self.scx.llmod.add_function(name, fn_type, None);
        let id = self.arena.push_function(func);
        self.functions.insert(name.to_owned(), id);
        id
    }

    pub fn get_function(&self, name: &str) -> Option<FunctionId> {
        self.functions.get(name).copied()
    }

    /// True if `function` was declared with exactly the types of `sig`.
    pub fn signature_matches(&self, function: FunctionId, sig: &FunctionSig) -> bool {
        self.arena.get_function(function).get_type() == self.fn_type(sig)
    }

    /// The function as a `ptr` value.
    pub fn function_value(&mut self, function: FunctionId) -> ValueId {
        let ptr = self
            .arena
            .get_function(function)
            .as_global_value()
            .as_pointer_value();
        self.arena.push_value(ptr.into())
    }

    pub fn function_name(&self, function: FunctionId) -> String {
        self.arena
            .get_function(function)
            .get_name()
            .to_string_lossy()
            .into_owned()
    }

    pub fn has_body(&self, function: FunctionId) -> bool {
        self.arena.get_function(function).count_basic_blocks() > 0
    }

    /// Parameter `index` of `function`.
    pub fn get_param(&mut self, function: FunctionId, index: u32) -> ValueId {
        let param = self
            .arena
            .get_function(function)
            .get_nth_param(index)
            .expect("parameter index out of range");
        self.arena.push_value(param)
    }

    pub fn set_param_name(&mut self, function: FunctionId, index: u32, name: &str) {
        if let Some(param) = self.arena.get_function(function).get_nth_param(index) {
            param.set_name(name);
        }
    }

    /// Add a private constant global initialized to `init` and return its
    /// address.
    pub fn add_constant(&mut self, name: &str, ty: LLVMTypeId, init: ValueId) -> ValueId {
        let llvm_ty = self.arena.get_type(ty);
        let global = self.scx.llmod.add_global(llvm_ty, None, name);
        global.set_initializer(&self.arena.get_value(init));
        global.set_constant(true);
        global.set_linkage(Linkage::Private);
        self.arena.push_value(global.as_pointer_value().into())
    }

    // -----------------------------------------------------------------------
    // Blocks and positioning
    // -----------------------------------------------------------------------

    pub fn append_block(&mut self, function: FunctionId, name: &str) -> BlockId {
        let func = self.arena.get_function(function);
        let bb = self.scx.llcx.append_basic_block(func, name);
        self.arena.push_block(bb)
    }

    pub fn set_current_function(&mut self, function: FunctionId) {
        self.current_function = Some(function);
    }

    pub fn position_at_end(&mut self, block: BlockId) {
        let bb = self.arena.get_block(block);
        self.builder.position_at_end(bb);
        self.current_block = Some(block);
    }

    #[inline]
    pub fn current_block(&self) -> Option<BlockId> {
        self.current_block
    }

    #[inline]
    pub fn current_function(&self) -> Option<FunctionId> {
        self.current_function
    }

    /// True if there is no open block, or the open block already ends in a
    /// terminator. Code emitted at such a point could never run.
    pub fn current_block_terminated(&self) -> bool {
        self.current_block.map_or(true, |b| {
            self.arena.get_block(b).get_terminator().is_some()
        })
    }

    /// Move `block` after the last block of its function.
    pub fn move_block_to_end(&mut self, block: BlockId) {
        let bb = self.arena.get_block(block);
        let last = bb.get_parent().and_then(|f| f.get_last_basic_block());
        if let Some(last) = last.filter(|&last| last != bb) {
            if bb.move_after(last).is_err() {
                self.record_codegen_error();
            }
        }
    }

    /// Labels of `function`'s blocks, in layout order.
    pub fn block_labels(&self, function: FunctionId) -> Vec<String> {
        self.arena
            .get_function(function)
            .get_basic_block_iter()
            .map(|bb| bb.get_name().to_string_lossy().into_owned())
            .collect()
    }

    pub fn save_position(&self) -> Position {
        Position {
            function: self.current_function,
            block: self.current_block,
        }
    }

    pub fn restore_position(&mut self, position: Position) {
        self.current_function = position.function;
        match position.block {
            Some(block) => self.position_at_end(block),
            None => {
                self.builder.clear_insertion_position();
                self.current_block = None;
            }
        }
    }
}
