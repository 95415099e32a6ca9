//! Stack growth for the recursive parser, evaluator and value renderer.
//!
//! Deeply nested source (long chains of calls, groups or nested arrays)
//! recurses once per level. Each recursive entry point goes through
//! [`ensure_sufficient_stack`], which moves onto a fresh stack segment when
//! the current one runs low.

/// Grow when less than this much stack remains.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment.
const STACK_PER_RECURSION: usize = 2 * 1024 * 1024;

#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
