//! # Cache Entry Lifecycle
//!
//! Per-key state holder with an active/passive lifecycle driven by the
//! owner-supplied [`Activator`].
//!
//! ## State Machine
//!
//! ```text
//!                 activate(activator, mode)
//!       ┌───────────────────────────────────────────┐
//!       │                                           ▼
//!   ┌───────────┐                             ┌───────────┐
//!   │  Passive  │                             │  Active   │
//!   │ value: ∅  │                             │ value: Arc│
//!   └───────────┘                             └───────────┘
//!       ▲                                           │
//!       └───────────────────────────────────────────┘
//!                 passivate(activator, reason)
//! ```
//!
//! No other transitions exist. An entry evicted from the orchestrator's
//! mapping is simply dropped; a key requested again gets a fresh entry.
//!
//! ## Concurrency
//!
//! A single `parking_lot::Mutex` guards the entry's lifecycle state. In
//! [`ActivationMode::Serialized`] the production call runs while holding that
//! lock, so a second caller racing to activate the same entry waits for the
//! in-flight activation and then observes the committed value. In
//! [`ActivationMode::Parallel`] the production call runs outside the lock and
//! the result is committed last-write-wins. Passivation always commits the
//! passive transition under the lock, so the release capability runs at most
//! once per activation in either mode.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::traits::{ActivationMode, Activator, PassivationReason};

struct EntryState<V> {
    value: Option<Arc<V>>,
    active: bool,
    last_activation: Option<Instant>,
}

impl<V> EntryState<V> {
    fn commit(&mut self, value: Arc<V>) {
        self.value = Some(value);
        self.active = true;
        self.last_activation = Some(Instant::now());
    }
}

/// Per-key lifecycle state holder.
///
/// Created passive (no value) when a key first misses; holds a value only
/// while active. The key is immutable identity.
pub struct CacheEntry<K, V> {
    key: K,
    state: Mutex<EntryState<V>>,
}

impl<K, V> CacheEntry<K, V> {
    /// Creates a passive entry for `key`.
    pub fn new(key: K) -> Self {
        Self {
            key,
            state: Mutex::new(EntryState {
                value: None,
                active: false,
                last_activation: None,
            }),
        }
    }

    /// The entry's key.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Whether the entry currently holds a value.
    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    /// The value, if the entry is active.
    pub fn value(&self) -> Option<Arc<V>> {
        let state = self.state.lock();
        if state.active {
            state.value.clone()
        } else {
            None
        }
    }

    /// Time of the most recent successful activation, if any.
    pub fn last_activation(&self) -> Option<Instant> {
        self.state.lock().last_activation
    }

    /// Whether the entry's age exceeds `timeout`.
    ///
    /// A zero `timeout` disables staleness. An entry that has never been
    /// activated is never stale; staleness only applies to entries that held
    /// a value at some point.
    pub fn is_stale(&self, timeout: Duration) -> bool {
        if timeout.is_zero() {
            return false;
        }
        match self.state.lock().last_activation {
            Some(at) => at.elapsed() > timeout,
            None => false,
        }
    }

    /// Produces and stores a value via `activator`, returning it.
    ///
    /// Idempotent: an already-active entry returns its stored value without
    /// invoking the activator. On production failure the entry remains
    /// passive and the error propagates unchanged.
    pub fn activate<A>(&self, activator: &A, mode: ActivationMode) -> Result<Arc<V>, A::Error>
    where
        A: Activator<K, V>,
    {
        match mode {
            ActivationMode::Serialized => {
                let mut state = self.state.lock();
                if state.active {
                    if let Some(value) = &state.value {
                        return Ok(Arc::clone(value));
                    }
                }
                // Production runs inside the entry lock: racing callers wait
                // here and take the already-active branch afterwards.
                let value = Arc::new(activator.activate(&self.key)?);
                state.commit(Arc::clone(&value));
                Ok(value)
            }
            ActivationMode::Parallel => {
                {
                    let state = self.state.lock();
                    if state.active {
                        if let Some(value) = &state.value {
                            return Ok(Arc::clone(value));
                        }
                    }
                }
                // Production runs unlocked; commits race last-write-wins and
                // only one produced value is ultimately retained.
                let value = Arc::new(activator.activate(&self.key)?);
                let mut state = self.state.lock();
                state.commit(Arc::clone(&value));
                Ok(value)
            }
        }
    }

    /// Releases the stored value via `activator`.
    ///
    /// Idempotent: a passive entry is a no-op. The passive transition commits
    /// under the entry lock before the release call returns, so two
    /// concurrent passivations cannot both invoke the release capability. The
    /// entry stays passive even if release fails; the error propagates and
    /// the cache's bookkeeping does not roll back.
    pub fn passivate<A>(&self, activator: &A, reason: PassivationReason) -> Result<(), A::Error>
    where
        A: Activator<K, V>,
    {
        let mut state = self.state.lock();
        if !state.active {
            return Ok(());
        }
        state.active = false;
        match state.value.take() {
            Some(value) => activator.passivate(&self.key, value, reason),
            None => Ok(()),
        }
    }
}

impl<K: std::fmt::Debug, V> std::fmt::Debug for CacheEntry<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("active", &state.active)
            .field("last_activation", &state.last_activation)
            .finish()
    }
}
