//! Cache Store Module
//!
//! Authoritative key-value mapping with hit/miss accounting.

use std::collections::HashMap;

use crate::cache::{CacheStats, Counters};
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Key-value storage. Presence here is the only thing that decides whether
/// a key exists; expiry is tracked by the [`ExpiryIndex`](crate::cache::ExpiryIndex).
#[derive(Debug, Default)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, String>,
    /// Lookup statistics
    counters: Counters,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Retrieves a value by key, counting a hit or a miss.
    ///
    /// Only needs `&self`, so concurrent lookups can share a read lock.
    pub fn get(&self, key: &str) -> Result<String> {
        match self.entries.get(key) {
            Some(value) => {
                self.counters.record_hit();
                Ok(value.clone())
            }
            None => {
                self.counters.record_miss();
                Err(CacheError::NotFound)
            }
        }
    }

    // == Set ==
    /// Stores a value, overwriting any previous one.
    pub fn set(&mut self, key: String, value: String) {
        self.entries.insert(key, value);
    }

    // == Delete ==
    /// Removes a key. Absent keys are ignored.
    ///
    /// Returns true if the key was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    // == Stats ==
    /// Returns current hit, miss and size figures.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits(),
            misses: self.counters.misses(),
            size: self.entries.len(),
        }
    }

    /// Borrows the raw mapping for snapshotting.
    pub fn entries(&self) -> &HashMap<String, String> {
        &self.entries
    }

    /// Swaps in a new mapping, keeping the counters.
    pub fn replace_entries(&mut self, entries: HashMap<String, String>) {
        self.entries = entries;
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
