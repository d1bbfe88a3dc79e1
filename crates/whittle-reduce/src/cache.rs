//! Content-addressed verdict cache.
//!
//! Candidates are keyed by length + crc32 of their bytes; the oracle is
//! not re-invoked for a key already seen this session. Bounded LRU: a hit
//! refreshes the entry, inserts evict the stalest entry when full.

use indexmap::IndexMap;

use crate::oracle::Verdict;

/// Cache key for candidate content.
pub(crate) fn content_key(bytes: &[u8]) -> u64 {
    ((bytes.len() as u64) << 32) | u64::from(crc32fast::hash(bytes))
}

#[derive(Debug, Default)]
pub(crate) struct ContentCache {
    map: IndexMap<u64, Verdict>,
    capacity: usize,
}

impl ContentCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            map: IndexMap::new(),
            capacity,
        }
    }

    pub(crate) fn get(&mut self, key: u64) -> Option<Verdict> {
        let verdict = self.map.shift_remove(&key)?;
        self.map.insert(key, verdict);
        Some(verdict)
    }

    pub(crate) fn insert(&mut self, key: u64, verdict: Verdict) {
        if self.capacity == 0 {
            return;
        }
        if self.map.len() >= self.capacity && !self.map.contains_key(&key) {
            self.map.shift_remove_index(0);
        }
        self.map.insert(key, verdict);
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }
}
