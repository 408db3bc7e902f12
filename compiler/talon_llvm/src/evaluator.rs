//! In-process execution of generated code.
//!
//! The [`Evaluator`] hands a finished module to LLVM's JIT. External
//! functions resolve against the host process (`printf`, `malloc`, ...)
//! unless [`Evaluator::bind`] maps them to an address first, which is how
//! tests observe the calls a program makes.

use inkwell::execution_engine::ExecutionEngine;
use inkwell::module::Module;
use inkwell::types::BasicTypeEnum;
use inkwell::values::FunctionValue;
use inkwell::OptimizationLevel;

/// Failure to run generated code.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("module does not verify: {0}")]
    Invalid(String),
    #[error("cannot create the JIT: {0}")]
    Engine(String),
    #[error("no function '{0}' in the module")]
    Missing(String),
    #[error("'{0}' has a body and cannot be bound to an external address")]
    Defined(String),
    #[error("'{name}' does not have the signature '{expected}'")]
    Signature { name: String, expected: &'static str },
}

/// A verified module loaded into LLVM's JIT.
pub struct Evaluator<'ctx> {
    module: Module<'ctx>,
    engine: ExecutionEngine<'ctx>,
}

impl<'ctx> Evaluator<'ctx> {
    /// Verify `module` and load it into a new execution engine.
    pub fn new(module: Module<'ctx>) -> Result<Self, EvalError> {
        module
            .verify()
            .map_err(|err| EvalError::Invalid(err.to_string()))?;
        let engine = module
            .create_jit_execution_engine(OptimizationLevel::None)
            .map_err(|err| EvalError::Engine(err.to_string()))?;
        Ok(Evaluator { module, engine })
    }

    pub fn module(&self) -> &Module<'ctx> {
        &self.module
    }

    /// Resolve the external function `name` to `addr` instead of the
    /// host symbol of that name.
    ///
    /// `addr` must be an `extern "C"` function whose signature matches the
    /// declaration.
    pub fn bind(&self, name: &str, addr: usize) -> Result<(), EvalError> {
        let func = self.function(name)?;
        if func.count_basic_blocks() > 0 {
            return Err(EvalError::Defined(name.to_owned()));
        }
        self.engine.add_global_mapping(&func, addr);
        Ok(())
    }

    /// Run `name`, which must be `i32 ()`.
    #[allow(unsafe_code)]
    pub fn run_i32(&self, name: &str) -> Result<i32, EvalError> {
        let func = self.function(name)?;
        let returns_i32 = matches!(
            func.get_type().get_return_type(),
            Some(BasicTypeEnum::IntType(ty)) if ty.get_bit_width() == 32
        );
        if func.count_params() != 0 || !returns_i32 {
            return Err(EvalError::Signature {
                name: name.to_owned(),
                expected: "i32 ()",
            });
        }
        // SAFETY: the declaration was checked to take no arguments and
        // return an i32, and the module passed the verifier.
        unsafe {
            let compiled = self
                .engine
                .get_function::<unsafe extern "C" fn() -> i32>(name)
                .map_err(|err| EvalError::Missing(format!("{name}: {err}")))?;
            Ok(compiled.call())
        }
    }

    /// Run `name`, which must be `ptr ()`, and return the address.
    #[allow(unsafe_code)]
    pub fn run_ptr(&self, name: &str) -> Result<*const u8, EvalError> {
        let func = self.function(name)?;
        let returns_ptr = matches!(
            func.get_type().get_return_type(),
            Some(BasicTypeEnum::PointerType(_))
        );
        if func.count_params() != 0 || !returns_ptr {
            return Err(EvalError::Signature {
                name: name.to_owned(),
                expected: "ptr ()",
            });
        }
        // SAFETY: as in `run_i32`, with a pointer result.
        unsafe {
            let compiled = self
                .engine
                .get_function::<unsafe extern "C" fn() -> *const u8>(name)
                .map_err(|err| EvalError::Missing(format!("{name}: {err}")))?;
            Ok(compiled.call())
        }
    }

    /// Run `name`, which must be `void ()`.
    #[allow(unsafe_code)]
    pub fn run_void(&self, name: &str) -> Result<(), EvalError> {
        let func = self.function(name)?;
        if func.count_params() != 0 || func.get_type().get_return_type().is_some() {
            return Err(EvalError::Signature {
                name: name.to_owned(),
                expected: "void ()",
            });
        }
        // SAFETY: as in `run_i32`, without a result.
        unsafe {
            let compiled = self
                .engine
                .get_function::<unsafe extern "C" fn()>(name)
                .map_err(|err| EvalError::Missing(format!("{name}: {err}")))?;
            compiled.call();
        }
        Ok(())
    }

    fn function(&self, name: &str) -> Result<FunctionValue<'ctx>, EvalError> {
        self.module
            .get_function(name)
            .ok_or_else(|| EvalError::Missing(name.to_owned()))
    }
}
