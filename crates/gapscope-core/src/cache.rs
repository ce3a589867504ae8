//! Explicit memoization of analysis results.
//!
//! Entries are keyed by a [`Fingerprint`] of the serialized input snapshot, so
//! identical input hits and any change to the input misses. Eviction is
//! least-recently-used.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Content hash of a serializable input snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Fingerprint the JSON encoding of `value`.
    pub fn of<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Self> {
        let bytes = serde_json::to_vec(value)?;
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        Ok(Self(hasher.finish()))
    }

    /// Combine two fingerprints (e.g. dataset and config) into one key.
    pub fn combine(self, other: Fingerprint) -> Self {
        let mut hasher = DefaultHasher::new();
        self.0.hash(&mut hasher);
        other.0.hash(&mut hasher);
        Self(hasher.finish())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Hit/miss counters of a cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU memo table from input fingerprints to shared results.
#[derive(Debug)]
pub struct MemoCache<V> {
    entries: HashMap<Fingerprint, Arc<V>>,
    access_order: VecDeque<Fingerprint>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl<V> MemoCache<V> {
    /// A cache holding at most `capacity` entries. Zero disables storage.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            access_order: VecDeque::new(),
            capacity,
            hits: 0,
            misses: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up `key`, counting a hit or a miss.
    pub fn get(&mut self, key: Fingerprint) -> Option<Arc<V>> {
        match self.entries.get(&key).cloned() {
            Some(value) => {
                self.hits += 1;
                self.touch(key);
                tracing::debug!(%key, "cache hit");
                Some(value)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store `value` under `key`, evicting the least recently used entry when full.
    pub fn insert(&mut self, key: Fingerprint, value: V) -> Arc<V> {
        let value = Arc::new(value);
        if self.capacity == 0 {
            return value;
        }

        if self.entries.insert(key, Arc::clone(&value)).is_some() {
            self.touch(key);
        } else {
            self.access_order.push_back(key);
        }

        while self.entries.len() > self.capacity {
            match self.access_order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                    tracing::debug!(key = %oldest, "evicted cache entry");
                }
                None => break,
            }
        }
        value
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    pub fn get_or_insert_with<F>(&mut self, key: Fingerprint, compute: F) -> Arc<V>
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(key) {
            return value;
        }
        self.insert(key, compute())
    }

    pub fn invalidate(&mut self, key: Fingerprint) -> bool {
        if self.entries.remove(&key).is_some() {
            self.access_order.retain(|k| *k != key);
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.access_order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }

    fn touch(&mut self, key: Fingerprint) {
        if let Some(pos) = self.access_order.iter().position(|k| *k == key) {
            self.access_order.remove(pos);
        }
        self.access_order.push_back(key);
    }
}
