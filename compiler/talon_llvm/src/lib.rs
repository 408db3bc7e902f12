//! LLVM backend for Talon.
//!
//! Typed modules are lowered to an LLVM module through inkwell. The
//! [`Evaluator`] runs generated functions in-process with LLVM's JIT,
//! which is how the generated code is tested.
//!
//! # Architecture
//!
//! - **Context** (`context.rs`): the LLVM module, its target layout and
//!   the handful of types every lowering needs
//! - **Builder** (`codegen/ir_builder/`): ID-based wrapper over inkwell's
//!   builder that records misuse instead of panicking
//! - **Codegen** (`codegen/`): declaration pass, then definition pass over
//!   the typed syntax tree
//! - **Evaluator** (`evaluator.rs`): JIT execution of generated functions
//!
//! # Debug Environment Variables
//!
//! - `TALON_DEBUG`: Print the IR of every compiled module to stderr.
//!   Any non-empty value enables this.
//!   Example: `TALON_DEBUG=1 cargo test`
//!
//! - `TALON_LOG=talon_llvm=debug`: Enable debug-level tracing output.
//!
//! - `TALON_LOG=talon_llvm=trace`: Trace every function and lambda as it
//!   is defined.

#![allow(
    // LLVM uses u32 for struct indices, Rust collections index with usize
    clippy::cast_possible_truncation,
    // Constants are built from i64 through LLVM's u64 constructor
    clippy::cast_sign_loss,
    // Internal panics are invariant violations
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
)]

pub mod codegen;
pub mod context;
pub mod evaluator;

pub use codegen::{CodeGenerator, CodegenContext, IrBuilder};
pub use context::SimpleCx;
pub use evaluator::{EvalError, Evaluator};

// Re-export inkwell so drivers and tests share one LLVM binding.
pub use inkwell;
pub use inkwell::context::Context;
pub use inkwell::module::Module;
