// crates/traversal-group-store-sqlite/src/cache.rs
// ============================================================================
// Module: Lookup Cache
// Description: Bounded least-recently-used cache of immutable rows.
// Purpose: Answer repeated insert-or-find lookups without touching SQLite.
// Dependencies: traversal-group-core
// ============================================================================

//! ## Overview
//! Only rows that exist are cached; a miss always falls through to the
//! database so rows committed by other processes become visible. Cached rows
//! are immutable, so an entry can never go stale.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;
use traversal_group_core::CanonicalRepr;
use traversal_group_core::GraphId;
use traversal_group_core::GraphRecord;
use traversal_group_core::GroupClassRecord;
use traversal_group_core::PermGroupRecord;
use traversal_group_core::PermutationId;
use traversal_group_core::PermutationRecord;

// ============================================================================
// SECTION: LRU
// ============================================================================

/// Fixed-capacity map that evicts the least recently used entry.
#[derive(Debug)]
pub struct LruCache<K, V> {
    /// Maximum number of entries; zero disables caching.
    capacity: usize,
    /// Monotonic use counter.
    tick: u64,
    /// Values with the tick of their last use.
    entries: HashMap<K, (V, u64)>,
    /// Keys ordered by last use.
    order: BTreeMap<u64, K>,
    /// Lookups answered from the cache.
    hits: u64,
    /// Lookups that fell through.
    misses: u64,
}

impl<K: Clone + Eq + Hash, V: Clone> LruCache<K, V> {
    /// Creates an empty cache holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            tick: 0,
            entries: HashMap::new(),
            order: BTreeMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Returns a cached value and marks it as recently used.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let Some((value, stamp)) = self.entries.get_mut(key) else {
            self.misses += 1;
            return None;
        };
        self.order.remove(stamp);
        self.tick += 1;
        *stamp = self.tick;
        self.order.insert(self.tick, key.clone());
        self.hits += 1;
        Some(value.clone())
    }

    /// Inserts a value, evicting the least recently used entry when full.
    pub fn insert(&mut self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        if let Some((_, stamp)) = self.entries.remove(&key) {
            self.order.remove(&stamp);
        }
        self.tick += 1;
        self.order.insert(self.tick, key.clone());
        self.entries.insert(key, (value, self.tick));
        while self.entries.len() > self.capacity {
            let Some((_, oldest)) = self.order.pop_first() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }

    /// Returns the number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// SECTION: Lookup Cache
// ============================================================================

/// Hit and miss counters across every lookup table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that fell through to `SQLite`.
    pub misses: u64,
    /// Entries currently cached.
    pub entries: usize,
}

/// Per-table caches of immutable rows.
#[derive(Debug)]
pub struct LookupCache {
    /// Graph rows by id.
    pub graphs: LruCache<GraphId, GraphRecord>,
    /// Permutation rows by id.
    pub permutations: LruCache<PermutationId, PermutationRecord>,
    /// Class rows by repr.
    pub classes: LruCache<CanonicalRepr, GroupClassRecord>,
    /// Group rows by repr.
    pub groups: LruCache<CanonicalRepr, PermGroupRecord>,
}

impl LookupCache {
    /// Creates caches holding at most `capacity` entries each.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            graphs: LruCache::new(capacity),
            permutations: LruCache::new(capacity),
            classes: LruCache::new(capacity),
            groups: LruCache::new(capacity),
        }
    }

    /// Returns aggregated counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.graphs.hits
                + self.permutations.hits
                + self.classes.hits
                + self.groups.hits,
            misses: self.graphs.misses
                + self.permutations.misses
                + self.classes.misses
                + self.groups.misses,
            entries: self.graphs.len()
                + self.permutations.len()
                + self.classes.len()
                + self.groups.len(),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::LruCache;

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = LruCache::new(2);
        cache.insert(1, "one");
        cache.insert(2, "two");
        assert_eq!(cache.get(&1), Some("one"));
        cache.insert(3, "three");
        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.get(&1), Some("one"));
        assert_eq!(cache.get(&3), Some("three"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let mut cache = LruCache::new(0);
        cache.insert(1, "one");
        assert!(cache.is_empty());
        assert_eq!(cache.get(&1), None);
    }
}
