//! Bounded, concurrent `K -> atomic cell` map.
//!
//! The hotspot controllers and the throttling checker both need per-key
//! mutable counters (last-refill timestamp, remaining tokens, in-flight
//! count) under unbounded key cardinality. This module is the systems
//! encoding of the "stable-address cell" design described for this engine:
//! the map itself is guarded by a single [`parking_lot::Mutex`] around an
//! [`lru::LruCache`] (the same crate this workspace already uses for its
//! bounded eviction cache), but the *values* the map holds are `Arc<AtomicI64>`
//! cells. Evicting a map entry only drops the map's reference to the cell —
//! any caller still holding a cloned `Arc` from an in-flight CAS loop keeps a
//! perfectly valid pointer; it just won't be found by a *later* lookup, which
//! is the accepted "eviction looks like never-seen" trade-off.

use parking_lot::Mutex;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::AtomicI64;
use std::sync::Arc;

/// A single stable-address atomic cell, shared via `Arc` so eviction of the
/// owning map entry cannot invalidate a handle already in use.
pub type Cell = Arc<AtomicI64>;

/// A thread-safe bounded map from `K` to [`Cell`], with LRU capacity eviction.
pub struct BoundedLruMap<K: Hash + Eq> {
    inner: Mutex<lru::LruCache<K, Cell>>,
}

impl<K: Hash + Eq + Clone> BoundedLruMap<K> {
    /// Creates a new map with the given maximum entry count. A capacity of
    /// zero is clamped to one, since an LRU cache of zero size can hold
    /// nothing and would make every lookup a permanent miss.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity clamped to >= 1");
        Self {
            inner: Mutex::new(lru::LruCache::new(capacity)),
        }
    }

    /// Looks up `k`, touching its recency on a hit.
    pub fn get(&self, k: &K) -> Option<Cell> {
        self.inner.lock().get(k).cloned()
    }

    /// Inserts a fresh cell holding `initial` if `k` is absent, returning
    /// `None` to signal "you are the initializer". If `k` is already present,
    /// returns `Some(existing_cell)` without mutating it.
    ///
    /// Exactly one concurrent caller observes `None` for a given key — this is
    /// the single point through which every refill loop in this crate creates
    /// state, which is what rules out the classic "two callers both think
    /// they're first" token-bucket initialization race.
    pub fn add_if_absent(&self, k: K, initial: i64) -> Option<Cell> {
        let mut guard = self.inner.lock();
        if let Some(existing) = guard.get(&k) {
            return Some(existing.clone());
        }
        guard.put(k, Arc::new(AtomicI64::new(initial)));
        None
    }

    /// Current number of live entries (for capacity-bound tests).
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns `true` if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
