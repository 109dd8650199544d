//! # Activation Cache Orchestrator
//!
//! Bounded, lazily-populated object cache. Values are produced on demand by
//! an owner-supplied [`Activator`], retained up to a fixed capacity with LRU
//! eviction, optionally re-produced once they exceed a staleness timeout, and
//! released back to the activator with a [`PassivationReason`] whenever the
//! cache lets go of them.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                    ActivationCache<K, V, A, S>                   │
//!   │                                                                  │
//!   │   activator: A          max_size, timeout, mode, keep_stats      │
//!   │                                                                  │
//!   │   ┌───────────────── Mutex<CacheInner> ─────────────────────┐    │
//!   │   │                                                         │    │
//!   │   │  entries: S (EntryStore)        recency: RecencySet<K>  │    │
//!   │   │  ┌─────────┬──────────────┐     ┌─────────────────────┐ │    │
//!   │   │  │   Key   │ Arc<Entry>   │     │ seq-ordered key set │ │    │
//!   │   │  │  "a"    │  active      │     │ LRU ◄─────────► MRU │ │    │
//!   │   │  │  "b"    │  active      │     │  "b"          "a"   │ │    │
//!   │   │  └─────────┴──────────────┘     └─────────────────────┘ │    │
//!   │   │                                                         │    │
//!   │   │  request_count / activation_count / stale_timeout_count │    │
//!   │   │  distinct: Option<FxHashSet<K>>  (keep_stats only)      │    │
//!   │   └─────────────────────────────────────────────────────────┘    │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## get() Flow
//!
//! ```text
//!   get(key)
//!     │
//!     ├─ lock inner (short): count request, touch recency, look up entry
//!     │    ├─ hit ──► plan Hit(entry)
//!     │    └─ miss ─► plan Fill { victim: pop_lru()? }
//!     │  unlock
//!     │
//!     ├─ cache lock NOT held:
//!     │    Hit, active + fresh ──► return Arc<V>          (fast path)
//!     │    Hit, stale/passive ──► passivate(StaleEvicted)? then activate
//!     │    Fill ────────────────► passivate victim, activate new entry
//!     │
//!     └─ lock inner again (short): commit Fill / count (re)activation
//! ```
//!
//! The exclusive sections never call into the activator and never acquire an
//! entry's lifecycle lock, so a caller blocks only on its own key's in-flight
//! activation, never on another key's. Per-entry activation is serialized or
//! overlapping per [`ActivationMode`]; see [`CacheEntry`].
//!
//! ## Known Race
//!
//! Two callers missing on the same key before either commits each construct
//! and activate their own entry; the second committed insertion wins the
//! mapping. This is deliberate: misses are not coalesced into a single
//! production call, and the mapping level carries no per-key insertion lock.
//!
//! ## Invariants
//!
//! - `entries` and `recency` hold the same key set at every observation point
//!   outside an in-flight `get` (verified by [`check_invariants`](ActivationCache::check_invariants)).
//! - `len() <= capacity()` after any `get` returns.
//! - The fast path never invokes the activator.

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use crate::entry::CacheEntry;
use crate::error::InvariantError;
use crate::recency::RecencySet;
use crate::stats::CacheStatsSnapshot;
use crate::store::{EntryStore, FxHashStore};
use crate::traits::{ActivationMode, Activator, PassivationReason};

/// Default backing map for the cache: unordered FxHashMap of shared entries.
pub type DefaultStore<K, V> = FxHashStore<K, Arc<CacheEntry<K, V>>>;

struct CacheInner<K, S> {
    entries: S,
    recency: RecencySet<K>,
    request_count: u64,
    activation_count: u64,
    stale_timeout_count: u64,
    distinct: Option<FxHashSet<K>>,
}

/// What a `get` decided to do after its first exclusive section.
enum Plan<K, V> {
    /// Key is mapped. Staleness and the fast path are evaluated against the
    /// entry's own lifecycle lock, outside the cache-wide section.
    Hit(Arc<CacheEntry<K, V>>),
    /// New key: activate `entry` and commit it, releasing `victim` first if
    /// capacity forced an eviction.
    Fill {
        entry: Arc<CacheEntry<K, V>>,
        victim: Option<Arc<CacheEntry<K, V>>>,
    },
}

/// Bounded object cache with an activation/passivation lifecycle.
///
/// `get`/`clear` may be called from any number of threads; see the module
/// docs for the locking protocol.
///
/// # Example
///
/// ```
/// use std::convert::Infallible;
/// use std::sync::Arc;
/// use lifecache::builder::CacheBuilder;
/// use lifecache::traits::{Activator, PassivationReason};
///
/// struct Squares;
///
/// impl Activator<u64, u64> for Squares {
///     type Error = Infallible;
///     fn activate(&self, key: &u64) -> Result<u64, Infallible> {
///         Ok(key * key)
///     }
///     fn passivate(
///         &self,
///         _key: &u64,
///         _value: Arc<u64>,
///         _reason: PassivationReason,
///     ) -> Result<(), Infallible> {
///         Ok(())
///     }
/// }
///
/// let cache = CacheBuilder::new(2).build::<u64, u64, _>(Squares);
///
/// assert_eq!(*cache.get(&3).unwrap(), 9);
/// assert_eq!(*cache.get(&3).unwrap(), 9); // hit, no second activation
/// assert_eq!(cache.activation_count(), 1);
/// assert_eq!(cache.request_count(), 2);
/// ```
pub struct ActivationCache<K, V, A, S = DefaultStore<K, V>> {
    activator: A,
    max_size: usize,
    timeout_millis: AtomicU64,
    mode: ActivationMode,
    keep_stats: bool,
    inner: Mutex<CacheInner<K, S>>,
    _marker: std::marker::PhantomData<fn() -> V>,
}

impl<K, V, A, S> ActivationCache<K, V, A, S>
where
    K: Clone + Eq + Hash,
    A: Activator<K, V>,
    S: EntryStore<K, Arc<CacheEntry<K, V>>>,
{
    /// Creates a cache over a caller-supplied backing map.
    ///
    /// Prefer [`CacheBuilder`](crate::builder::CacheBuilder) for the common
    /// cases.
    pub fn with_store(
        activator: A,
        store: S,
        max_size: usize,
        timeout: Duration,
        mode: ActivationMode,
        keep_stats: bool,
    ) -> Self {
        Self {
            activator,
            max_size,
            timeout_millis: AtomicU64::new(duration_to_millis(timeout)),
            mode,
            keep_stats,
            inner: Mutex::new(CacheInner {
                entries: store,
                recency: RecencySet::new(),
                request_count: 0,
                activation_count: 0,
                stale_timeout_count: 0,
                distinct: keep_stats.then(FxHashSet::default),
            }),
            _marker: std::marker::PhantomData,
        }
    }

    /// Looks up `key`, producing the value on a miss or stale hit.
    ///
    /// Blocks only as long as the production capability itself blocks (or,
    /// under [`ActivationMode::Serialized`], as long as a concurrent
    /// activation of the same entry takes); it never waits on another key's
    /// in-flight activation. Activator errors propagate
    /// unchanged; on activation failure nothing partially-active remains
    /// reachable. If an eviction's passivation fails, the replacement is
    /// still activated and committed before that error is returned.
    pub fn get(&self, key: &K) -> Result<Arc<V>, A::Error> {
        let timeout = self.timeout();

        let plan = {
            let mut inner = self.inner.lock();
            inner.request_count += 1;
            if let Some(distinct) = inner.distinct.as_mut() {
                distinct.insert(key.clone());
            }

            match inner.entries.get(key).map(Arc::clone) {
                Some(entry) => {
                    inner.recency.touch(key);
                    debug_assert!(self.check_inner(&inner).is_ok());
                    Plan::Hit(entry)
                }
                None => {
                    inner.activation_count += 1;
                    let entry = Arc::new(CacheEntry::new(key.clone()));
                    let victim = if inner.entries.len() >= self.max_size {
                        match inner.recency.pop_lru() {
                            Some(lru_key) => inner.entries.remove(&lru_key),
                            None => None,
                        }
                    } else {
                        None
                    };
                    debug_assert!(self.check_inner(&inner).is_ok());
                    Plan::Fill { entry, victim }
                }
            }
        };

        match plan {
            Plan::Hit(entry) => {
                let stale = entry.is_stale(timeout);
                if !stale {
                    if let Some(value) = entry.value() {
                        // Fast path: active, fresh hit.
                        return Ok(value);
                    }
                }
                {
                    let mut inner = self.inner.lock();
                    inner.activation_count += 1;
                    if stale {
                        inner.stale_timeout_count += 1;
                    }
                }
                self.refresh(key, entry, stale)
            }
            Plan::Fill { entry, victim } => self.fill(key, entry, victim),
        }
    }

    /// Re-activates an entry already present in the mapping.
    fn refresh(
        &self,
        key: &K,
        entry: Arc<CacheEntry<K, V>>,
        stale: bool,
    ) -> Result<Arc<V>, A::Error> {
        let mut release_err = None;
        if stale {
            if let Err(err) = entry.passivate(&self.activator, PassivationReason::StaleEvicted) {
                release_err = Some(err);
            }
        }

        match entry.activate(&self.activator, self.mode) {
            Ok(value) => match release_err {
                Some(err) => Err(err),
                None => Ok(value),
            },
            Err(err) => {
                // The entry could not be refreshed: it remains evicted rather
                // than lingering passive in the mapping.
                let mut inner = self.inner.lock();
                let still_current = inner
                    .entries
                    .get(key)
                    .map_or(false, |current| Arc::ptr_eq(current, &entry));
                if still_current {
                    inner.entries.remove(key);
                    inner.recency.remove(key);
                }
                debug_assert!(self.check_inner(&inner).is_ok());
                Err(err)
            }
        }
    }

    /// Activates and commits a brand-new entry, evicting `victim` first.
    fn fill(
        &self,
        key: &K,
        entry: Arc<CacheEntry<K, V>>,
        victim: Option<Arc<CacheEntry<K, V>>>,
    ) -> Result<Arc<V>, A::Error> {
        let mut release_err = None;
        if let Some(victim) = victim {
            if let Err(err) = victim.passivate(&self.activator, PassivationReason::CapacityEvicted)
            {
                release_err = Some(err);
            }
        }

        // Activation failure leaves the new entry uncommitted: nothing
        // partially-active is ever reachable through the mapping.
        let value = entry.activate(&self.activator, self.mode)?;

        let mut overflow = Vec::new();
        if self.max_size > 0 {
            let mut inner = self.inner.lock();
            inner.entries.insert(key.clone(), entry);
            inner.recency.add(key.clone());
            // Another miss may have committed while our activation ran;
            // re-enforce the capacity bound before releasing the lock.
            while inner.entries.len() > self.max_size {
                match inner.recency.pop_lru() {
                    Some(lru_key) => {
                        if let Some(evicted) = inner.entries.remove(&lru_key) {
                            overflow.push(evicted);
                        }
                    }
                    None => break,
                }
            }
            debug_assert!(self.check_inner(&inner).is_ok());
        }
        for evicted in overflow {
            if let Err(err) = evicted.passivate(&self.activator, PassivationReason::CapacityEvicted)
            {
                release_err.get_or_insert(err);
            }
        }

        match release_err {
            Some(err) => Err(err),
            None => Ok(value),
        }
    }

    /// Passivates every entry with reason `Cleared`, empties the cache and
    /// resets all counters.
    ///
    /// The mapping and counters are reset under one exclusive section; the
    /// release calls then run outside it, at most once per entry. The cache
    /// is fully emptied even when a release fails; the first such error is
    /// returned after every entry has been released.
    pub fn clear(&self) -> Result<(), A::Error> {
        let drained = {
            let mut inner = self.inner.lock();
            let drained = inner.entries.drain();
            inner.recency.clear();
            inner.request_count = 0;
            inner.activation_count = 0;
            inner.stale_timeout_count = 0;
            if let Some(distinct) = inner.distinct.as_mut() {
                distinct.clear();
            }
            debug_assert!(self.check_inner(&inner).is_ok());
            drained
        };

        let mut first_err = None;
        for (_key, entry) in drained {
            if let Err(err) = entry.passivate(&self.activator, PassivationReason::Cleared) {
                first_err.get_or_insert(err);
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Current number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether no entries are cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of retained entries. Zero means nothing is retained.
    pub fn capacity(&self) -> usize {
        self.max_size
    }

    /// Whether `key` is currently cached. Does not affect recency order.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().entries.contains(key)
    }

    /// Number of `get` calls since construction or the last `clear`.
    pub fn request_count(&self) -> u64 {
        self.inner.lock().request_count
    }

    /// Number of `get` calls that required activation (miss, stale or
    /// capacity-zero).
    pub fn activation_count(&self) -> u64 {
        self.inner.lock().activation_count
    }

    /// Number of hits that were rejected as stale.
    pub fn stale_timeout_count(&self) -> u64 {
        self.inner.lock().stale_timeout_count
    }

    /// Number of distinct keys ever requested, or 0 when statistics were not
    /// enabled at construction.
    pub fn distinct_request_count(&self) -> usize {
        self.inner
            .lock()
            .distinct
            .as_ref()
            .map_or(0, FxHashSet::len)
    }

    /// Fraction of requests satisfied without activation. 0.0 before any
    /// request has been made.
    pub fn hit_rate(&self) -> f64 {
        let inner = self.inner.lock();
        rate(inner.request_count, inner.activation_count)
    }

    /// Fraction of requests not rejected for staleness. 0.0 before any
    /// request has been made.
    pub fn stale_rate(&self) -> f64 {
        let inner = self.inner.lock();
        rate(inner.request_count, inner.stale_timeout_count)
    }

    /// The staleness timeout. Zero disables staleness.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_millis.load(Ordering::Relaxed))
    }

    /// Replaces the staleness timeout; takes effect for subsequent `get`s.
    pub fn set_timeout(&self, timeout: Duration) {
        self.timeout_millis
            .store(duration_to_millis(timeout), Ordering::Relaxed);
    }

    /// The per-entry concurrency policy this cache was built with.
    pub fn activation_mode(&self) -> ActivationMode {
        self.mode
    }

    /// Whether distinct-key statistics tracking was enabled at construction.
    pub fn keep_stats(&self) -> bool {
        self.keep_stats
    }

    /// The activator this cache produces and releases values through.
    pub fn activator(&self) -> &A {
        &self.activator
    }

    /// Captures all statistics under a single lock acquisition.
    pub fn stats(&self) -> CacheStatsSnapshot {
        let inner = self.inner.lock();
        CacheStatsSnapshot {
            request_count: inner.request_count,
            activation_count: inner.activation_count,
            stale_timeout_count: inner.stale_timeout_count,
            distinct_request_count: inner.distinct.as_ref().map_or(0, FxHashSet::len),
            len: inner.entries.len(),
            capacity: self.max_size,
            hit_rate: rate(inner.request_count, inner.activation_count),
            stale_rate: rate(inner.request_count, inner.stale_timeout_count),
        }
    }

    /// Verifies that the backing map and the recency set agree.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.check_inner(&self.inner.lock())
    }

    fn check_inner(&self, inner: &CacheInner<K, S>) -> Result<(), InvariantError> {
        if inner.entries.len() != inner.recency.len() {
            return Err(InvariantError::new(format!(
                "store holds {} entries but recency tracks {} keys",
                inner.entries.len(),
                inner.recency.len()
            )));
        }
        for key in inner.recency.keys() {
            if !inner.entries.contains(key) {
                return Err(InvariantError::new(
                    "recency tracks a key absent from the store",
                ));
            }
        }
        if inner.entries.len() > self.max_size {
            return Err(InvariantError::new(format!(
                "store holds {} entries over capacity {}",
                inner.entries.len(),
                self.max_size
            )));
        }
        inner.recency.check_invariants()
    }
}

fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn rate(requests: u64, misses: u64) -> f64 {
    if requests == 0 {
        return 0.0;
    }
    // A racing clear can momentarily leave misses ahead of requests.
    requests.saturating_sub(misses) as f64 / requests as f64
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    use crate::builder::CacheBuilder;

    use super::*;

    struct Echo {
        activations: AtomicUsize,
    }

    impl Echo {
        fn new() -> Self {
            Self {
                activations: AtomicUsize::new(0),
            }
        }
    }

    impl Activator<u32, String> for Echo {
        type Error = Infallible;

        fn activate(&self, key: &u32) -> Result<String, Infallible> {
            self.activations.fetch_add(1, AtomicOrdering::SeqCst);
            Ok(format!("value-{key}"))
        }

        fn passivate(
            &self,
            _key: &u32,
            _value: Arc<String>,
            _reason: PassivationReason,
        ) -> Result<(), Infallible> {
            Ok(())
        }
    }

    #[test]
    fn miss_activates_and_caches() {
        let cache = CacheBuilder::new(4).build::<u32, String, _>(Echo::new());

        assert_eq!(*cache.get(&1).unwrap(), "value-1");
        assert!(cache.contains(&1));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.activation_count(), 1);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn hit_returns_same_instance() {
        let cache = CacheBuilder::new(4).build::<u32, String, _>(Echo::new());

        let first = cache.get(&1).unwrap();
        let second = cache.get(&1).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.activator().activations.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn capacity_zero_retains_nothing() {
        let cache = CacheBuilder::new(0).build::<u32, String, _>(Echo::new());

        for _ in 0..3 {
            assert_eq!(*cache.get(&7).unwrap(), "value-7");
        }
        assert_eq!(cache.len(), 0);
        assert!(!cache.contains(&7));
        assert_eq!(cache.activation_count(), 3);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn timeout_is_adjustable_at_runtime() {
        let cache = CacheBuilder::new(4).build::<u32, String, _>(Echo::new());
        assert_eq!(cache.timeout(), Duration::ZERO);

        cache.set_timeout(Duration::from_millis(250));
        assert_eq!(cache.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn stats_snapshot_is_consistent() {
        let cache = CacheBuilder::new(4)
            .keep_stats(true)
            .build::<u32, String, _>(Echo::new());

        cache.get(&1).unwrap();
        cache.get(&1).unwrap();
        cache.get(&2).unwrap();

        let stats = cache.stats();
        assert_eq!(stats.request_count, 3);
        assert_eq!(stats.activation_count, 2);
        assert_eq!(stats.distinct_request_count, 2);
        assert_eq!(stats.len, 2);
        assert_eq!(stats.capacity, 4);
        assert!((stats.hit_rate - 1.0 / 3.0).abs() < 1e-9);
        assert!((stats.stale_rate - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rates_are_zero_before_any_request() {
        let cache = CacheBuilder::new(4).build::<u32, String, _>(Echo::new());
        assert_eq!(cache.hit_rate(), 0.0);
        assert_eq!(cache.stale_rate(), 0.0);
    }
}
