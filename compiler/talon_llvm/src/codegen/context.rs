//! State shared by every module compiled into one output.
//!
//! Imported modules are generated into the same LLVM module as their
//! importer, so layouts, runtime type records and declared functions are
//! cached here rather than per generator. Every cache is keyed by pool
//! type, never by name: two types that print alike still get their own
//! struct.

use inkwell::context::Context;
use inkwell::module::Module;
use rustc_hash::FxHashMap;
use talon_diagnostic::{CompileError, CompileResult};
use talon_types::Idx;

use super::ir_builder::{FunctionSig, IrBuilder};
use super::value_id::{FunctionId, LLVMTypeId, ValueId};
use crate::context::SimpleCx;

/// Runtime functions every output declares.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Runtime {
    /// `ptr malloc(i64)`
    pub(crate) malloc: FunctionId,
    /// `void free(ptr)`
    pub(crate) free: FunctionId,
}

/// Parameters, return type and captures of a closure layout.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ClosureKey {
    pub(crate) params: Vec<Idx>,
    pub(crate) ret: Idx,
    pub(crate) captures: Vec<Idx>,
}

pub struct CodegenContext<'ctx> {
    pub(crate) builder: IrBuilder<'ctx>,
    pub(crate) runtime: Runtime,
    /// Struct layout of every by-pointer type lowered so far.
    pub(crate) layouts: FxHashMap<Idx, LLVMTypeId>,
    /// Closure layouts, shared by closures of the same shape.
    pub(crate) closure_layouts: FxHashMap<ClosureKey, LLVMTypeId>,
    /// `talon.Dynamic[T]` box layouts, keyed by `T`.
    pub(crate) dynamic_layouts: FxHashMap<Idx, LLVMTypeId>,
    /// Address of the runtime `Type` record of each boxed type.
    pub(crate) runtime_types: FxHashMap<Idx, ValueId>,
    /// The shared constant standing for each field-less case.
    pub(crate) singletons: FxHashMap<Idx, ValueId>,
    /// String literal records, keyed by contents.
    pub(crate) strings: FxHashMap<String, ValueId>,
    next_lambda: u32,
}

impl<'ctx> CodegenContext<'ctx> {
    /// Start an empty module named `module_name` for the host target.
    pub fn new(context: &'ctx Context, module_name: &str) -> CompileResult<Self> {
        let scx = SimpleCx::new(context, module_name).map_err(|err| {
            CompileError::internal(format!("cannot set up the host target: {err}"))
        })?;
        let mut builder = IrBuilder::new(scx);
        let ptr = builder.ptr_type();
        let i64_ty = builder.i64_type();
        let malloc = FunctionSig {
            params: vec![i64_ty],
            ret: Some(ptr),
            varargs: false,
        };
        let free = FunctionSig {
            params: vec![ptr],
            ret: None,
            varargs: false,
        };
        let runtime = Runtime {
            malloc: builder.declare_function("malloc", &malloc),
            free: builder.declare_function("free", &free),
        };
        Ok(CodegenContext {
            builder,
            runtime,
            layouts: FxHashMap::default(),
            closure_layouts: FxHashMap::default(),
            dynamic_layouts: FxHashMap::default(),
            runtime_types: FxHashMap::default(),
            singletons: FxHashMap::default(),
            strings: FxHashMap::default(),
            next_lambda: 0,
        })
    }

    pub fn builder(&self) -> &IrBuilder<'ctx> {
        &self.builder
    }

    /// Number of instruction-level misuse errors recorded so far.
    pub fn codegen_error_count(&self) -> u32 {
        self.builder.codegen_error_count()
    }

    /// Name for the next lambda function: `_Tc_lambda.0`, `_Tc_lambda.1`, ...
    pub(crate) fn next_lambda_name(&mut self) -> String {
        let name = format!("_Tc_lambda.{}", self.next_lambda);
        self.next_lambda += 1;
        name
    }

    pub fn into_module(self) -> Module<'ctx> {
        self.builder.into_module()
    }
}
