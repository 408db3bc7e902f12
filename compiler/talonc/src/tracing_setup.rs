//! Tracing subscriber for the compiler passes.

use std::sync::Once;

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use tracing_tree::HierarchicalLayer;

static TRACING_INIT: Once = Once::new();

/// Install a hierarchical subscriber filtered by `TALON_LOG`, or
/// `RUST_LOG` when that is unset.
///
/// Safe to call more than once; does nothing when neither variable is set
/// or another subscriber is already installed.
pub fn init() {
    TRACING_INIT.call_once(|| {
        let directives = std::env::var("TALON_LOG").or_else(|_| std::env::var("RUST_LOG"));
        let Ok(directives) = directives else {
            return;
        };
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::new(directives))
            .with(
                HierarchicalLayer::new(2)
                    .with_targets(true)
                    .with_bracketed_fields(true),
            )
            .try_init();
    });
}
