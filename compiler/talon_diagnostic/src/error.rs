//! The fatal error taxonomy shared by both passes.

use super::{Diagnostic, ErrorCode};

pub type CompileResult<T> = Result<T, CompileError>;

/// A fatal compilation error.
///
/// There is no recovery: the pass that detects one returns it and the
/// compilation unit is abandoned.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// Operand, argument, assignment or return type is incompatible.
    #[error("{message}")]
    TypeMismatch { message: String },

    /// Call arity does not match the target's declared parameters.
    #[error("missing arguments to '{function}' (needed {needed}, got {given})")]
    MissingArguments {
        function: String,
        needed: usize,
        given: usize,
    },

    /// Positional argument after a named one, or an unknown argument name.
    #[error("{message}")]
    BadCall { message: String },

    /// Identifier not found in any enclosing scope.
    #[error("unable to find '{name}' in scope")]
    Uninitialized { name: String },

    /// No such operator or method on a type.
    #[error("unknown operation '{operation}' on '{type_name}'")]
    UnknownOperation {
        operation: String,
        type_name: String,
    },

    #[error("unable to find '{path}' to import")]
    ImportNotFound { path: String },

    #[error("import cycle detected while importing '{path}'")]
    ImportCycle { path: String },

    /// A broken internal invariant, never caused by the input program alone.
    #[error("internal compiler error: {message}")]
    Internal { message: String },
}

impl CompileError {
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        CompileError::TypeMismatch {
            message: message.into(),
        }
    }

    pub fn missing_arguments(function: impl Into<String>, needed: usize, given: usize) -> Self {
        CompileError::MissingArguments {
            function: function.into(),
            needed,
            given,
        }
    }

    pub fn bad_call(message: impl Into<String>) -> Self {
        CompileError::BadCall {
            message: message.into(),
        }
    }

    pub fn uninitialized(name: impl Into<String>) -> Self {
        CompileError::Uninitialized { name: name.into() }
    }

    pub fn unknown_operation(operation: impl Into<String>, type_name: impl Into<String>) -> Self {
        CompileError::UnknownOperation {
            operation: operation.into(),
            type_name: type_name.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CompileError::Internal {
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            CompileError::TypeMismatch { .. } => ErrorCode::E2001,
            CompileError::Uninitialized { .. } => ErrorCode::E2003,
            CompileError::MissingArguments { .. } => ErrorCode::E2004,
            CompileError::BadCall { .. } => ErrorCode::E2005,
            CompileError::UnknownOperation { .. } => ErrorCode::E2006,
            CompileError::ImportNotFound { .. } => ErrorCode::E3001,
            CompileError::ImportCycle { .. } => ErrorCode::E3002,
            CompileError::Internal { .. } => ErrorCode::E9001,
        }
    }

    /// Convert to a diagnostic with hints where a common fix exists.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::new(self.code(), self.to_string());
        match self {
            CompileError::MissingArguments { needed, given, .. } => {
                diag.with_suggestion(if given > needed {
                    "remove extra arguments"
                } else {
                    "add missing arguments"
                })
            }
            CompileError::BadCall { .. } => {
                diag.with_suggestion("pass positional arguments before any named argument")
            }
            CompileError::Uninitialized { name } if name.starts_with('@') => diag
                .with_suggestion(format!("declare the instance variable with `var {name} : Type`")),
            CompileError::ImportNotFound { .. } => {
                diag.with_note("imports are searched under each configured import path")
            }
            CompileError::Internal { .. } => {
                diag.with_note("this is a bug in the compiler, not in the program")
            }
            _ => diag,
        }
    }
}
