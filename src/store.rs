//! Backing-map abstraction for the cache's key → entry association.
//!
//! The orchestrator keeps policy logic (recency order, lifecycle, counters)
//! independent of how entries are associated with keys. [`EntryStore`] is the
//! minimal mutable-map surface the cache needs; [`FxHashStore`] is the default
//! unordered hash implementation. A caller can supply an alternative backing
//! map at construction via
//! [`CacheBuilder::build_with_store`](crate::builder::CacheBuilder::build_with_store).
//!
//! The store is always owned exclusively by the orchestrator and mutated only
//! under its lock, so the trait is single-threaded by design.

use std::hash::Hash;

use rustc_hash::FxHashMap;

/// Associative container mapping keys to cache entries.
pub trait EntryStore<K, E> {
    /// Fetch an entry by key.
    fn get(&self, key: &K) -> Option<&E>;

    /// Check if a key exists.
    fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace an entry. Returns the displaced entry if present.
    fn insert(&mut self, key: K, entry: E) -> Option<E>;

    /// Remove an entry by key.
    fn remove(&mut self, key: &K) -> Option<E>;

    /// Current number of entries.
    fn len(&self) -> usize;

    /// Check if the store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return all entries.
    fn drain(&mut self) -> Vec<(K, E)>;

    /// Remove all entries.
    fn clear(&mut self);
}

/// Default backing map: unordered `FxHashMap`.
///
/// Preallocated to the cache capacity so steady-state operation does not
/// rehash.
#[derive(Debug)]
pub struct FxHashStore<K, E> {
    map: FxHashMap<K, E>,
}

impl<K, E> FxHashStore<K, E>
where
    K: Eq + Hash,
{
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            map: FxHashMap::default(),
        }
    }

    /// Creates an empty store with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }
}

impl<K, E> Default for FxHashStore<K, E>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, E> EntryStore<K, E> for FxHashStore<K, E>
where
    K: Eq + Hash,
{
    #[inline]
    fn get(&self, key: &K) -> Option<&E> {
        self.map.get(key)
    }

    #[inline]
    fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    #[inline]
    fn insert(&mut self, key: K, entry: E) -> Option<E> {
        self.map.insert(key, entry)
    }

    #[inline]
    fn remove(&mut self, key: &K) -> Option<E> {
        self.map.remove(key)
    }

    #[inline]
    fn len(&self) -> usize {
        self.map.len()
    }

    fn drain(&mut self) -> Vec<(K, E)> {
        self.map.drain().collect()
    }

    fn clear(&mut self) {
        self.map.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove_roundtrip() {
        let mut store: FxHashStore<u32, &str> = FxHashStore::with_capacity(4);

        assert_eq!(store.insert(1, "one"), None);
        assert_eq!(store.insert(1, "uno"), Some("one"));
        assert_eq!(store.get(&1), Some(&"uno"));
        assert!(store.contains(&1));
        assert_eq!(store.len(), 1);

        assert_eq!(store.remove(&1), Some("uno"));
        assert_eq!(store.remove(&1), None);
        assert!(store.is_empty());
    }

    #[test]
    fn drain_empties_and_returns_everything() {
        let mut store: FxHashStore<u32, u32> = FxHashStore::new();
        for i in 0..8 {
            store.insert(i, i * 10);
        }

        let mut drained = store.drain();
        drained.sort_unstable();
        assert_eq!(drained.len(), 8);
        assert_eq!(drained[3], (3, 30));
        assert!(store.is_empty());
    }

    #[test]
    fn clear_removes_all() {
        let mut store: FxHashStore<u32, u32> = FxHashStore::new();
        store.insert(1, 1);
        store.insert(2, 2);
        store.clear();
        assert_eq!(store.len(), 0);
        assert!(!store.contains(&1));
    }
}
