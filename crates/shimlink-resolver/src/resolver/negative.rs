// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Bounded cache of names known to be unresolvable

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe negative cache with approximate-LRU eviction
///
/// Each entry carries the tick of its last insert or hit. When an insert
/// pushes the cache over capacity, the oldest entries are dropped in one
/// batch, never including the entry that triggered the eviction.
pub struct NegativeCache {
    /// Lowercased module name -> recency tick
    entries: DashMap<String, u64>,
    clock: AtomicU64,
    capacity: usize,
}

impl NegativeCache {
    /// Create an empty cache holding at most `capacity` names
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            clock: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Whether `name` is known unresolvable. A hit refreshes its recency.
    pub fn contains(&self, name: &str) -> bool {
        let key = name.to_ascii_lowercase();
        match self.entries.get_mut(&key) {
            Some(mut entry) => {
                *entry = self.tick();
                true
            }
            None => false,
        }
    }

    /// Remember `name` as unresolvable
    pub fn insert(&self, name: &str) {
        let key = name.to_ascii_lowercase();
        self.entries.insert(key.clone(), self.tick());
        if self.entries.len() > self.capacity {
            self.evict(&key);
        }
    }

    /// Remove one name
    pub fn remove(&self, name: &str) -> bool {
        self.entries.remove(&name.to_ascii_lowercase()).is_some()
    }

    fn evict(&self, keep: &str) {
        // Evict in batches so a full cache doesn't sort on every insert
        let target = self.capacity - self.capacity / 8;
        let mut by_age: Vec<(u64, String)> = self
            .entries
            .iter()
            .filter(|entry| entry.key() != keep)
            .map(|entry| (*entry.value(), entry.key().clone()))
            .collect();
        by_age.sort_unstable();

        let excess = self.entries.len().saturating_sub(target);
        for (_, key) in by_age.into_iter().take(excess) {
            self.entries.remove(&key);
        }
    }

    /// Forget every name
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of cached names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of names
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for NegativeCache {
    fn default() -> Self {
        Self::new(512)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let cache = NegativeCache::new(4);
        cache.insert("Il2CppFoo");
        assert!(cache.contains("il2cppfoo"));
        assert!(!cache.contains("Il2CppBar"));
        assert!(cache.remove("IL2CPPFOO"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_eviction_stays_bounded_and_keeps_newest() {
        let cache = NegativeCache::new(16);
        for i in 0..100 {
            let name = format!("Il2CppMissing{i}");
            cache.insert(&name);
            assert!(cache.len() <= cache.capacity());
            assert!(cache.contains(&name));
        }
    }

    #[test]
    fn test_eviction_prefers_least_recent() {
        let cache = NegativeCache::new(8);
        for i in 0..8 {
            cache.insert(&format!("m{i}"));
        }
        // Refresh the oldest entry so it survives the next eviction
        assert!(cache.contains("m0"));
        cache.insert("m8");

        assert!(cache.len() <= 8);
        assert!(cache.contains("m0"));
        assert!(cache.contains("m8"));
        assert!(!cache.contains("m1"));
    }

    #[test]
    fn test_capacity_one() {
        let cache = NegativeCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.insert("a");
        cache.insert("b");
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("b"));
    }

    #[test]
    fn test_clear() {
        let cache = NegativeCache::new(4);
        cache.insert("a");
        cache.insert("b");
        cache.clear();
        assert!(cache.is_empty());
    }
}
