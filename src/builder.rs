//! Construction surface for [`ActivationCache`].
//!
//! Collects the recognized configuration options (capacity is required, the
//! rest have defaults) and assembles a cache over the default hash backing
//! map or a caller-supplied one.
//!
//! ## Example
//!
//! ```
//! use std::convert::Infallible;
//! use std::sync::Arc;
//! use std::time::Duration;
//! use lifecache::builder::CacheBuilder;
//! use lifecache::traits::{Activator, PassivationReason};
//!
//! struct Negate;
//!
//! impl Activator<i64, i64> for Negate {
//!     type Error = Infallible;
//!     fn activate(&self, key: &i64) -> Result<i64, Infallible> {
//!         Ok(-key)
//!     }
//!     fn passivate(
//!         &self,
//!         _key: &i64,
//!         _value: Arc<i64>,
//!         _reason: PassivationReason,
//!     ) -> Result<(), Infallible> {
//!         Ok(())
//!     }
//! }
//!
//! let cache = CacheBuilder::new(128)
//!     .timeout(Duration::from_secs(30))
//!     .parallel_activation(false)
//!     .keep_stats(true)
//!     .build::<i64, i64, _>(Negate);
//!
//! assert_eq!(*cache.get(&5).unwrap(), -5);
//! assert_eq!(cache.capacity(), 128);
//! ```

use std::hash::Hash;
use std::time::Duration;

use crate::cache::{ActivationCache, DefaultStore};
use crate::entry::CacheEntry;
use crate::store::{EntryStore, FxHashStore};
use crate::traits::{ActivationMode, Activator};

/// Builder for [`ActivationCache`] instances.
///
/// Defaults: no staleness timeout, parallel activation allowed, statistics
/// tracking off.
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    max_size: usize,
    timeout: Duration,
    parallel_activation: bool,
    keep_stats: bool,
}

impl CacheBuilder {
    /// Creates a builder for a cache retaining at most `max_size` entries.
    ///
    /// `max_size` of 0 is legal: every lookup activates and nothing is ever
    /// retained.
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            timeout: Duration::ZERO,
            parallel_activation: true,
            keep_stats: false,
        }
    }

    /// Sets the staleness timeout. Zero (the default) disables staleness.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Allows or forbids overlapping activations of the same entry.
    ///
    /// Defaults to allowed; see
    /// [`ActivationMode`](crate::traits::ActivationMode).
    pub fn parallel_activation(mut self, allowed: bool) -> Self {
        self.parallel_activation = allowed;
        self
    }

    /// Enables tracking of the full distinct-key request history.
    ///
    /// Off by default; when off,
    /// [`distinct_request_count`](ActivationCache::distinct_request_count)
    /// reports 0.
    pub fn keep_stats(mut self, keep: bool) -> Self {
        self.keep_stats = keep;
        self
    }

    fn mode(&self) -> ActivationMode {
        if self.parallel_activation {
            ActivationMode::Parallel
        } else {
            ActivationMode::Serialized
        }
    }

    /// Builds a cache over the default unordered hash backing map.
    pub fn build<K, V, A>(self, activator: A) -> ActivationCache<K, V, A>
    where
        K: Clone + Eq + Hash,
        A: Activator<K, V>,
    {
        let store: DefaultStore<K, V> = FxHashStore::with_capacity(self.max_size);
        self.build_with_store(activator, store)
    }

    /// Builds a cache over a caller-supplied backing map implementation.
    pub fn build_with_store<K, V, A, S>(self, activator: A, store: S) -> ActivationCache<K, V, A, S>
    where
        K: Clone + Eq + Hash,
        A: Activator<K, V>,
        S: EntryStore<K, std::sync::Arc<CacheEntry<K, V>>>,
    {
        let mode = self.mode();
        ActivationCache::with_store(
            activator,
            store,
            self.max_size,
            self.timeout,
            mode,
            self.keep_stats,
        )
    }
}
