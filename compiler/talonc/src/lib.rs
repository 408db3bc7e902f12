//! Talon compiler driver.
//!
//! Runs the type calculator and the code generator over a parsed module
//! and its imports and returns the verified IR module. Reading the root
//! source, parsing and invoking a native toolchain on the IR belong to the
//! caller.
//!
//! # Environment
//!
//! - `TALON_DEBUG`: dump the generated IR to stderr (see [`CompileOptions`]).
//! - `TALON_PATH`: colon-separated import roots, replacing `lib`.
//! - `TALON_LOG` / `RUST_LOG`: tracing filter for [`tracing_setup::init`].
//!
//! # Architecture
//!
//! ```text
//! talon_ir ─> talon_types ─> talon_llvm
//!                   \            /
//!                    talonc  ← this crate
//! ```

mod loader;
mod options;
mod session;
pub mod tracing_setup;

pub use loader::{FsLoader, MemoryLoader, Parser, SourceLoader};
pub use options::CompileOptions;
pub use session::Session;

use talon_diagnostic::CompileResult;
use talon_ir::{StringInterner, SyntaxTree};
use talon_llvm::{Context, Module};
use talon_types::{GlobalEnv, Pool};

/// Compile `tree` and its imports into one verified IR module owned by
/// `context`.
#[tracing::instrument(level = "debug", skip_all, fields(module = %options.module_name))]
pub fn compile<'ctx>(
    context: &'ctx Context,
    tree: &SyntaxTree,
    interner: &StringInterner,
    loader: &dyn SourceLoader,
    options: &CompileOptions,
) -> CompileResult<Module<'ctx>> {
    let global = GlobalEnv::new(interner);
    let mut pool = Pool::new();
    let mut session = Session::new(context, interner, &global, loader, &options.module_name)?;
    session.compile_unit(tree, &mut pool)?;
    session.finish(options.dump_ir)
}

#[cfg(test)]
mod tests;
