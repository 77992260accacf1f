//! Native stack headroom for recursive paths.
//!
//! `run_value` re-enters the dispatch loop from native code, and display
//! conversion walks nested containers; both can recurse arbitrarily deep.
//! The interpreter's own frames live on its return stack, not here.

/// Run `f` with at least a red zone of native stack available, growing the
/// stack on a fresh segment when needed.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    const RED_ZONE: usize = 100 * 1024;
    const GROW_BY: usize = 1024 * 1024;

    stacker::maybe_grow(RED_ZONE, GROW_BY, f)
}

/// WASM manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
