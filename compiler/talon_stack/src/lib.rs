//! Stack growth for the recursive tree walks.
//!
//! Both the type calculator and the code generator recurse once per syntax
//! node. Deeply nested bodies (long `if`/`else` chains, nested closures)
//! can exhaust the main thread's stack, so each node dispatch runs through
//! [`ensure_sufficient_stack`].
//!
//! On `wasm32` the call is a plain passthrough.

/// Grow when less than this much stack remains.
const RED_ZONE: usize = 128 * 1024;

/// Size of each freshly allocated stack segment.
const SEGMENT: usize = 2 * 1024 * 1024;

/// Run `f`, first switching to a new stack segment if the current one is
/// close to exhausted.
#[cfg(not(target_arch = "wasm32"))]
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT, f)
}

/// Run `f` directly; the wasm runtime manages its own stack.
#[cfg(target_arch = "wasm32")]
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    let _ = (RED_ZONE, SEGMENT);
    f()
}

#[cfg(test)]
mod tests {
    use super::ensure_sufficient_stack;

    fn depth(n: u32) -> u32 {
        ensure_sufficient_stack(|| if n == 0 { 0 } else { 1 + depth(n - 1) })
    }

    #[test]
    fn passes_through_return_value() {
        assert_eq!(ensure_sufficient_stack(|| 7), 7);
    }

    #[test]
    fn survives_deep_recursion() {
        assert_eq!(depth(50_000), 50_000);
    }
}
