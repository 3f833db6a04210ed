//! Bounded TTL cache for generated descriptions, keyed by stable entity
//! keys (`creature:<id>`, `species:<id>`, `civ:<id>`).

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

struct CacheEntry {
    value: String,
    inserted: Instant,
}

pub struct DescriptionCache {
    entries: BTreeMap<String, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
}

impl DescriptionCache {
    #[must_use]
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn get(&mut self, key: &str) -> Option<String> {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|e| e.inserted.elapsed() > self.ttl);
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|e| e.value.clone())
    }

    pub fn put(&mut self, key: String, value: String) {
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
            self.evict_oldest();
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                inserted: Instant::now(),
            },
        );
    }

    fn evict_oldest(&mut self) {
        if let Some(key) = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.inserted)
            .map(|(k, _)| k.clone())
        {
            self.entries.remove(&key);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
