//! # Activation Boundary Contract
//!
//! This module defines the single external interface a cache owner must
//! supply: the [`Activator`], a production/release capability invoked by the
//! cache on misses, staleness and evictions. It also carries the two small
//! policy vocabularies shared across the crate: [`PassivationReason`] and
//! [`ActivationMode`].
//!
//! ## Protocol
//!
//! ```text
//!                 ┌─────────────────────────────────────────┐
//!                 │            Activator<K, V>              │
//!                 │                                         │
//!                 │  activate(&K) → Result<V, Error>        │
//!                 │  passivate(&K, Arc<V>, reason)          │
//!                 │           → Result<(), Error>           │
//!                 └──────────────────┬──────────────────────┘
//!                                    │ called by
//!                                    ▼
//!   miss ──────────────► activate(key)
//!   stale hit ─────────► passivate(key, value, StaleEvicted) + activate(key)
//!   capacity eviction ─► passivate(key, value, CapacityEvicted)
//!   clear() ───────────► passivate(key, value, Cleared)        (per entry)
//! ```
//!
//! ## Concurrency Requirements
//!
//! Implementations must tolerate concurrent invocations for *different* keys
//! at all times. When the cache is built with
//! [`ActivationMode::Parallel`], `activate` may additionally be invoked
//! concurrently for the *same* key; only one of the produced values is
//! ultimately retained (last write wins).
//!
//! ## Error Semantics
//!
//! The cache performs no retry and no suppression: any error returned by
//! `activate` or `passivate` propagates unchanged to the caller of
//! [`ActivationCache::get`](crate::cache::ActivationCache::get) or
//! [`ActivationCache::clear`](crate::cache::ActivationCache::clear).

use std::fmt;
use std::sync::Arc;

/// Value production/release capability supplied by the cache's owner.
///
/// The cache invokes `activate` to produce a value for a key that missed (or
/// went stale), and `passivate` to release a value it is letting go of. The
/// associated `Error` type is the owner's own failure kind (for example,
/// backing-store unavailable); the cache never interprets it.
///
/// # Example
///
/// ```
/// use std::convert::Infallible;
/// use std::sync::Arc;
/// use lifecache::traits::{Activator, PassivationReason};
///
/// struct Upper;
///
/// impl Activator<String, String> for Upper {
///     type Error = Infallible;
///
///     fn activate(&self, key: &String) -> Result<String, Infallible> {
///         Ok(key.to_uppercase())
///     }
///
///     fn passivate(
///         &self,
///         _key: &String,
///         _value: Arc<String>,
///         _reason: PassivationReason,
///     ) -> Result<(), Infallible> {
///         Ok(())
///     }
/// }
/// ```
pub trait Activator<K, V> {
    /// Failure kind for production and release.
    type Error: std::error::Error;

    /// Produces the value for `key`.
    ///
    /// May block (e.g. on a backing store); the cache never holds its own
    /// exclusive section across this call, so an expensive activation does
    /// not stall lookups for unrelated keys.
    fn activate(&self, key: &K) -> Result<V, Self::Error>;

    /// Releases a value the cache is discarding.
    ///
    /// `reason` explains why the value is being let go; it is informational
    /// only and does not change the cache's own behavior.
    fn passivate(
        &self,
        key: &K,
        value: Arc<V>,
        reason: PassivationReason,
    ) -> Result<(), Self::Error>;
}

/// Why a cached value is being released.
///
/// A closed enumeration handed to [`Activator::passivate`]. The reasons are
/// meaningful to the owner's release logic only; passivation behavior is
/// identical for all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassivationReason {
    /// Evicted as the least-recently-used entry to make room for another key.
    CapacityEvicted,
    /// Evicted because the entry's age exceeded the configured timeout.
    StaleEvicted,
    /// The entry became unreachable (owner-driven teardown).
    ///
    /// The cache itself never emits this reason: it passivates only on
    /// explicit eviction, staleness or clear. The variant stays in the
    /// contract so owner code tearing a cache down can release values it
    /// extracted by other means.
    Discarded,
    /// Released by a bulk [`clear`](crate::cache::ActivationCache::clear).
    Cleared,
}

impl fmt::Display for PassivationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PassivationReason::CapacityEvicted => "capacity-evicted",
            PassivationReason::StaleEvicted => "stale-evicted",
            PassivationReason::Discarded => "discarded",
            PassivationReason::Cleared => "cleared",
        };
        f.write_str(name)
    }
}

/// How concurrent activations of the same entry are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationMode {
    /// One activation per entry at a time.
    ///
    /// The production call runs while holding the entry's lifecycle lock; a
    /// second caller racing on the same entry waits for the in-flight
    /// activation instead of invoking the activator redundantly.
    Serialized,
    /// Overlapping activations of the same entry are allowed.
    ///
    /// The production call runs outside the entry lock and the result is
    /// committed last-write-wins. Useful when production is expensive but
    /// idempotent.
    Parallel,
}
