//! # Recency-Ordered Key Set
//!
//! Tracks the set of currently cached keys ordered by last-touch time, backing
//! the cache's LRU eviction decisions.
//!
//! ## Architecture
//!
//! ```text
//!   ┌────────────────────────────────────────────────────────────────┐
//!   │                        RecencySet<K>                           │
//!   │                                                                │
//!   │   next_seq: 7   (monotonic, never reused within an instance)   │
//!   │                                                                │
//!   │   by_seq: BTreeMap<u64, K>         seq_of: FxHashMap<K, u64>   │
//!   │   ┌──────┬──────┐                  ┌──────┬──────┐             │
//!   │   │  2   │  A   │ ◄── LRU (min)    │  A   │  2   │             │
//!   │   │  5   │  C   │                  │  B   │  6   │             │
//!   │   │  6   │  B   │ ◄── MRU (max)    │  C   │  5   │             │
//!   │   └──────┴──────┘                  └──────┴──────┘             │
//!   │                                                                │
//!   │   touch(A): remove seq 2, insert seq 7, seq_of[A] = 7          │
//!   └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! | Method      | Complexity | Description                                |
//! |-------------|------------|--------------------------------------------|
//! | `touch(&k)` | O(log n)   | Promote an existing key to MRU             |
//! | `add(k)`    | O(log n)   | Insert as MRU, or promote if present       |
//! | `pop_lru()` | O(log n)   | Remove and return the LRU key              |
//! | `peek_lru()`| O(log n)   | Observe the LRU key without removing       |
//! | `remove(&k)`| O(log n)   | Drop a key from the set                    |
//! | `len()`     | O(1)       | Number of tracked keys                     |
//!
//! Every touch/add retires the key's old sequence number and assigns a fresh
//! maximal one, so the LRU key is always the current minimum of `by_seq` and
//! the MRU key the current maximum. The two containers are kept manually in
//! sync; `check_invariants` verifies the pairing.

use std::collections::BTreeMap;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::error::InvariantError;

/// Set of keys ordered by last-touch recency.
///
/// Sequence numbers are never reused within a single instance's lifetime, so
/// ordering comparisons are always unambiguous.
#[derive(Debug)]
pub struct RecencySet<K> {
    next_seq: u64,
    by_seq: BTreeMap<u64, K>,
    seq_of: FxHashMap<K, u64>,
}

impl<K> RecencySet<K>
where
    K: Clone + Eq + Hash,
{
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            next_seq: 0,
            by_seq: BTreeMap::new(),
            seq_of: FxHashMap::default(),
        }
    }

    #[inline]
    fn bump(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Promotes `key` to most-recently-used.
    ///
    /// Returns `false` (no-op) if the key is not tracked.
    pub fn touch(&mut self, key: &K) -> bool {
        let Some(&old) = self.seq_of.get(key) else {
            return false;
        };
        let fresh = self.bump();
        if let Some(owned) = self.by_seq.remove(&old) {
            self.by_seq.insert(fresh, owned);
        }
        self.seq_of.insert(key.clone(), fresh);
        true
    }

    /// Inserts `key` as most-recently-used.
    ///
    /// If the key is already tracked this behaves like [`touch`](Self::touch).
    /// Returns whether an insertion (vs. a promotion) occurred.
    pub fn add(&mut self, key: K) -> bool {
        if self.seq_of.contains_key(&key) {
            self.touch(&key);
            return false;
        }
        let fresh = self.bump();
        self.by_seq.insert(fresh, key.clone());
        self.seq_of.insert(key, fresh);
        true
    }

    /// Removes and returns the least-recently-used key, or `None` if empty.
    pub fn pop_lru(&mut self) -> Option<K> {
        let (_, key) = self.by_seq.pop_first()?;
        self.seq_of.remove(&key);
        Some(key)
    }

    /// Observes the least-recently-used key without removing it.
    pub fn peek_lru(&self) -> Option<&K> {
        self.by_seq.first_key_value().map(|(_, key)| key)
    }

    /// Removes `key` if present; returns whether it was tracked.
    pub fn remove(&mut self, key: &K) -> bool {
        let Some(seq) = self.seq_of.remove(key) else {
            return false;
        };
        self.by_seq.remove(&seq);
        true
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.seq_of.len()
    }

    /// Whether no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.seq_of.is_empty()
    }

    /// Drops all keys. The sequence counter is not reset.
    pub fn clear(&mut self) {
        self.by_seq.clear();
        self.seq_of.clear();
    }

    /// Iterates tracked keys in LRU → MRU order.
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.by_seq.values()
    }

    /// Iterates tracked keys in arbitrary order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.seq_of.keys()
    }

    /// Verifies that both internal containers agree.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.by_seq.len() != self.seq_of.len() {
            return Err(InvariantError::new(format!(
                "recency container size mismatch: by_seq={} seq_of={}",
                self.by_seq.len(),
                self.seq_of.len()
            )));
        }
        for (&seq, key) in &self.by_seq {
            match self.seq_of.get(key) {
                Some(&mapped) if mapped == seq => {}
                Some(&mapped) => {
                    return Err(InvariantError::new(format!(
                        "recency sequence mismatch: ordered={seq} indexed={mapped}"
                    )));
                }
                None => {
                    return Err(InvariantError::new(
                        "recency key present in order but missing from index",
                    ));
                }
            }
            if seq >= self.next_seq {
                return Err(InvariantError::new(
                    "live sequence number at or beyond the counter",
                ));
            }
        }
        Ok(())
    }
}

impl<K> Default for RecencySet<K>
where
    K: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn add_then_pop_in_insertion_order() {
        let mut set = RecencySet::new();
        assert!(set.add("a"));
        assert!(set.add("b"));
        assert!(set.add("c"));
        assert_eq!(set.len(), 3);

        assert_eq!(set.pop_lru(), Some("a"));
        assert_eq!(set.pop_lru(), Some("b"));
        assert_eq!(set.pop_lru(), Some("c"));
        assert_eq!(set.pop_lru(), None);
        assert!(set.is_empty());
    }

    #[test]
    fn touch_promotes_to_mru() {
        let mut set = RecencySet::new();
        set.add("a");
        set.add("b");
        set.add("c");

        assert!(set.touch(&"a"));
        assert_eq!(set.peek_lru(), Some(&"b"));
        assert_eq!(set.pop_lru(), Some("b"));
        assert_eq!(set.pop_lru(), Some("c"));
        assert_eq!(set.pop_lru(), Some("a"));
    }

    #[test]
    fn touch_absent_key_is_noop() {
        let mut set: RecencySet<&str> = RecencySet::new();
        set.add("a");
        assert!(!set.touch(&"missing"));
        assert_eq!(set.len(), 1);
        set.check_invariants().unwrap();
    }

    #[test]
    fn add_existing_key_behaves_like_touch() {
        let mut set = RecencySet::new();
        set.add("a");
        set.add("b");

        // Re-adding "a" promotes it, reports no insertion.
        assert!(!set.add("a"));
        assert_eq!(set.len(), 2);
        assert_eq!(set.pop_lru(), Some("b"));
    }

    #[test]
    fn remove_reports_presence() {
        let mut set = RecencySet::new();
        set.add(1);
        set.add(2);

        assert!(set.remove(&1));
        assert!(!set.remove(&1));
        assert_eq!(set.len(), 1);
        assert_eq!(set.pop_lru(), Some(2));
    }

    #[test]
    fn clear_keeps_sequence_counter_monotonic() {
        let mut set = RecencySet::new();
        set.add(1);
        set.add(2);
        let counter_before = set.next_seq;
        set.clear();
        assert!(set.is_empty());

        set.add(3);
        assert!(set.next_seq > counter_before);
        set.check_invariants().unwrap();
    }

    #[test]
    fn iter_yields_lru_to_mru() {
        let mut set = RecencySet::new();
        set.add("a");
        set.add("b");
        set.add("c");
        set.touch(&"b");

        let order: Vec<_> = set.iter().copied().collect();
        assert_eq!(order, vec!["a", "c", "b"]);
    }

    // Model-based check: the set must agree with a naive Vec model where the
    // back is MRU and the front is LRU.
    #[derive(Debug, Clone)]
    enum Op {
        Add(u8),
        Touch(u8),
        Remove(u8),
        PopLru,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..16).prop_map(Op::Add),
            (0u8..16).prop_map(Op::Touch),
            (0u8..16).prop_map(Op::Remove),
            Just(Op::PopLru),
        ]
    }

    proptest! {
        #[test]
        fn matches_vec_model(ops in proptest::collection::vec(op_strategy(), 0..64)) {
            let mut set = RecencySet::new();
            let mut model: Vec<u8> = Vec::new();

            for op in ops {
                match op {
                    Op::Add(k) => {
                        let inserted = set.add(k);
                        let was_present = model.contains(&k);
                        model.retain(|&m| m != k);
                        model.push(k);
                        prop_assert_eq!(inserted, !was_present);
                    }
                    Op::Touch(k) => {
                        let touched = set.touch(&k);
                        let was_present = model.contains(&k);
                        if was_present {
                            model.retain(|&m| m != k);
                            model.push(k);
                        }
                        prop_assert_eq!(touched, was_present);
                    }
                    Op::Remove(k) => {
                        let removed = set.remove(&k);
                        let was_present = model.contains(&k);
                        model.retain(|&m| m != k);
                        prop_assert_eq!(removed, was_present);
                    }
                    Op::PopLru => {
                        let popped = set.pop_lru();
                        let expected = if model.is_empty() {
                            None
                        } else {
                            Some(model.remove(0))
                        };
                        prop_assert_eq!(popped, expected);
                    }
                }

                prop_assert_eq!(set.len(), model.len());
                prop_assert!(set.check_invariants().is_ok());
                let order: Vec<u8> = set.iter().copied().collect();
                prop_assert_eq!(order, model.clone());
            }
        }
    }
}
