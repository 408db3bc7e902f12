// Test code uses unwrap/expect for clarity - panics provide good test failure messages
#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end tests of the driver.
//!
//! Trees are built in memory with `TreeBuilder`, compiled through
//! `talonc::compile` and the resulting IR is run in LLVM's JIT.
//!
//! - `common` - tree and evaluation helpers
//! - `properties` - whole-program behaviour of the two passes
//! - `imports` - nested compilation of imported modules
//! - `loader` - the file-system loader

#[path = "phases/common.rs"]
mod common;

#[path = "phases/properties.rs"]
mod properties;

#[path = "phases/imports.rs"]
mod imports;

#[path = "phases/loader.rs"]
mod loader;
