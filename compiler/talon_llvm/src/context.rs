//! The LLVM module under construction and its target.
//!
//! `SimpleCx` holds only what every lowering needs: the module, the
//! context that owns its types, and the data layout of the host target.
//! The module is configured for the host so that sizes computed here are
//! the sizes the JIT and the native toolchain will use.

use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::targets::{
    CodeModel, InitializationConfig, RelocMode, Target, TargetData, TargetMachine,
};
use inkwell::types::{AnyType, IntType, PointerType};
use inkwell::{AddressSpace, OptimizationLevel};

/// Minimal LLVM context: module, context and target layout.
pub struct SimpleCx<'ll> {
    /// The LLVM context (owns all LLVM types and values).
    pub llcx: &'ll Context,
    /// The LLVM module being compiled.
    pub llmod: Module<'ll>,
    /// Layout of the host target, also set on `llmod`.
    pub target_data: TargetData,
}

impl<'ll> SimpleCx<'ll> {
    /// Create a module named `module_name` laid out for the host.
    ///
    /// Fails if LLVM was built without support for the host target.
    pub fn new(context: &'ll Context, module_name: &str) -> Result<Self, String> {
        Target::initialize_native(&InitializationConfig::default())?;
        let triple = TargetMachine::get_default_triple();
        let target = Target::from_triple(&triple).map_err(|err| err.to_string())?;
        let machine = target
            .create_target_machine(
                &triple,
                "generic",
                "",
                OptimizationLevel::None,
                RelocMode::Default,
                CodeModel::Default,
            )
            .ok_or_else(|| format!("no target machine for '{triple}'"))?;
        let target_data = machine.get_target_data();

        let llmod = context.create_module(module_name);
        llmod.set_triple(&triple);
        llmod.set_data_layout(&target_data.get_data_layout());
        Ok(Self {
            llcx: context,
            llmod,
            target_data,
        })
    }

    // -- Type constructors --

    #[inline]
    pub fn type_i1(&self) -> IntType<'ll> {
        self.llcx.bool_type()
    }

    #[inline]
    pub fn type_i8(&self) -> IntType<'ll> {
        self.llcx.i8_type()
    }

    #[inline]
    pub fn type_i32(&self) -> IntType<'ll> {
        self.llcx.i32_type()
    }

    #[inline]
    pub fn type_i64(&self) -> IntType<'ll> {
        self.llcx.i64_type()
    }

    /// The opaque pointer type.
    #[inline]
    pub fn type_ptr(&self) -> PointerType<'ll> {
        self.llcx.ptr_type(AddressSpace::default())
    }

    /// Allocation size of `ty` in bytes on the host.
    pub fn size_of(&self, ty: &dyn AnyType<'ll>) -> u64 {
        self.target_data.get_abi_size(ty)
    }
}
