//! lifecache: bounded, lazily-populated object cache with an
//! activation/passivation lifecycle, LRU eviction and optional staleness.
//!
//! See `src/cache.rs` for the orchestrator's locking protocol and invariants.

pub mod builder;
pub mod cache;
pub mod entry;
pub mod error;
pub mod prelude;
pub mod recency;
pub mod stats;
pub mod store;
pub mod traits;
