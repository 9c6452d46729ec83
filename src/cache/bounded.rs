//! Bounded Cache Module
//!
//! Fixed-capacity key/value map with least-recently-used eviction.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use crate::cache::{CacheStats, LruList, Slot};
use crate::error::{CacheError, Result};

#[derive(Debug)]
struct Slotted<V> {
    value: V,
    slot: Slot,
}

// == Bounded Cache ==
/// In-memory cache holding at most `capacity` entries.
///
/// Every `get` hit and every `set` makes the touched key the most recently
/// used. Inserting a new key into a full cache evicts exactly one entry, the
/// least recently used, before the insertion completes.
///
/// The cache does no internal locking; wrap it in a lock to share it.
#[derive(Debug)]
pub struct BoundedCache<K, V> {
    entries: HashMap<K, Slotted<V>>,
    lru: LruList<K>,
    stats: CacheStats,
    capacity: usize,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
{
    // == Constructor ==
    /// Creates an empty cache.
    ///
    /// Returns `CacheError::Configuration` when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::Configuration(
                "cache capacity must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            entries: HashMap::with_capacity(capacity),
            lru: LruList::with_capacity(capacity),
            stats: CacheStats::new(capacity),
            capacity,
        })
    }

    // == Get ==
    /// Returns the value for `key` and marks it most recently used.
    ///
    /// A miss has no effect besides being counted.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.entries.get(key) {
            Some(entry) => {
                self.lru.touch(entry.slot);
                self.stats.record_hit();
                Some(&entry.value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Returns the value for `key` without touching recency or statistics.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).map(|entry| &entry.value)
    }

    // == Set ==
    /// Inserts or overwrites `key`, making it the most recently used.
    ///
    /// Returns the entry evicted to make room, if any. Overwriting an existing
    /// key never evicts.
    pub fn set(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.value = value;
            self.lru.touch(entry.slot);
            return None;
        }

        let evicted = if self.entries.len() >= self.capacity {
            self.evict_oldest()
        } else {
            None
        };

        let slot = self.lru.push_front(key.clone());
        self.entries.insert(key, Slotted { value, slot });
        self.stats.set_total_entries(self.entries.len());

        evicted
    }

    // == Has ==
    /// Reports whether `key` is present without affecting recency.
    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    // == Delete ==
    /// Removes `key` and returns its value.
    pub fn delete<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entry = self.entries.remove(key)?;
        self.lru.remove(entry.slot);
        self.stats.set_total_entries(self.entries.len());
        Some(entry.value)
    }

    // == Clear ==
    /// Drops every entry. Capacity and hit/miss counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.stats.set_total_entries(0);
    }

    /// Current number of entries, never above `capacity()`.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Iterates entries from least to most recently used.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.lru
            .iter()
            .filter_map(move |key| self.entries.get(key).map(|entry| (key, &entry.value)))
    }

    fn evict_oldest(&mut self) -> Option<(K, V)> {
        let key = self.lru.evict_oldest()?;
        let entry = self.entries.remove(&key)?;
        self.stats.record_eviction();
        Some((key, entry.value))
    }
}
