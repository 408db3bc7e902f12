//! Errors and diagnostics for the Talon compiler core.
//!
//! Every failure in either pass is a [`CompileError`]. Errors are fatal: the
//! first one aborts the compilation unit and propagates to the driver, which
//! turns it into a [`Diagnostic`] for display.

mod diagnostic;
mod error;
mod error_code;

pub use diagnostic::Diagnostic;
pub use error::{CompileError, CompileResult};
pub use error_code::ErrorCode;
