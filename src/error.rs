//! Error types for the lifecache library.
//!
//! ## Key Components
//!
//! - [`InvariantError`]: Returned when internal data-structure invariants are
//!   violated (`check_invariants` methods on [`RecencySet`](crate::recency::RecencySet)
//!   and [`ActivationCache`](crate::cache::ActivationCache)).
//!
//! Errors raised by the caller-supplied [`Activator`](crate::traits::Activator)
//! are not wrapped here: production and release failures propagate unchanged
//! through `get`/`clear` as the activator's own error type. An
//! `InvariantError`, by contrast, indicates a defect in the cache itself, not
//! a runtime condition callers should handle.

use std::fmt;

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by `check_invariants` methods on cache types
/// (e.g. [`ActivationCache::check_invariants`](crate::cache::ActivationCache::check_invariants)).
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
