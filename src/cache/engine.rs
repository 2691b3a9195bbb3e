//! Cache Engine Module
//!
//! Combines the key-value store and the expiry index behind one lock.
//!
//! Every mutation (`set`, `delete`, `sweep`, `dump`, `restore`) takes the
//! write half so the sweep and snapshots always observe the index and the
//! mapping together. Lookups take the read half; hit/miss counters are atomic.

use std::collections::HashSet;
use std::io::{Read, Write};

use chrono::{TimeDelta, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::snapshot::{write_snapshot, Snapshot};
use crate::cache::{CacheStats, CacheStore, ExpiryIndex};
use crate::error::Result;

#[derive(Debug, Default)]
struct CacheState {
    store: CacheStore,
    index: ExpiryIndex,
}

// == Cache Engine ==
/// Thread-safe cache with per-key expiry.
///
/// Shared between the protocol handlers and the eviction task as
/// `Arc<CacheEngine>`.
#[derive(Debug, Default)]
pub struct CacheEngine {
    state: RwLock<CacheState>,
}

impl CacheEngine {
    // == Constructor ==
    /// Creates an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Retrieves a value by key.
    pub async fn get(&self, key: &str) -> Result<String> {
        self.state.read().await.store.get(key)
    }

    // == Set ==
    /// Stores a value that expires `ttl` from now.
    ///
    /// A zero or negative `ttl` makes the key eligible for the next sweep.
    pub async fn set(&self, key: impl Into<String>, value: impl Into<String>, ttl: TimeDelta) {
        let expires_at = expiry_timestamp(ttl);
        self.set_expiring_at(key, value, expires_at).await;
    }

    /// Stores a value that expires at the given Unix second.
    ///
    /// Overwriting a key adds a new index record without retiring the old
    /// one, so the key is also removed when its earlier expiry is swept.
    pub async fn set_expiring_at(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
        expires_at: i64,
    ) {
        let key = key.into();
        let mut state = self.state.write().await;
        state.index.insert(expires_at, key.clone());
        state.store.set(key, value.into());
    }

    // == Delete ==
    /// Removes a key from the store. The expiry index is left untouched.
    pub async fn delete(&self, key: &str) {
        self.state.write().await.store.delete(key);
    }

    // == Stats ==
    /// Returns hits, misses and the live key count.
    pub async fn stats(&self) -> CacheStats {
        self.state.read().await.store.stats()
    }

    /// Returns the number of timestamp nodes in the expiry index.
    pub async fn expiry_nodes(&self) -> usize {
        self.state.read().await.index.len()
    }

    // == Sweep ==
    /// Removes every key whose index record is at or before `now`
    /// (Unix seconds) and returns the keys taken from the index.
    ///
    /// Keys already deleted from the store are skipped silently.
    pub async fn sweep(&self, now: i64) -> HashSet<String> {
        let mut state = self.state.write().await;
        let expired = state.index.remove_through(now);

        let mut deleted = 0;
        for key in &expired {
            if state.store.delete(key) {
                deleted += 1;
            }
        }

        debug!(
            now,
            records = expired.len(),
            deleted,
            nodes = state.index.len(),
            "Sweep finished"
        );
        expired
    }

    /// Sweeps with the current wall-clock second.
    pub async fn evict_expired(&self) -> HashSet<String> {
        self.sweep(Utc::now().timestamp()).await
    }

    // == Dump ==
    /// Writes the full index and mapping into `sink` as one binary unit.
    pub async fn dump<W: Write>(&self, sink: W) -> Result<()> {
        let state = self.state.write().await;
        write_snapshot(&state.index, &state.store, sink)
    }

    // == Restore ==
    /// Replaces the current contents with a snapshot read from `source`.
    ///
    /// The snapshot is fully decoded before the lock is taken; on error the
    /// engine keeps whatever it held before. Hit/miss counters are kept.
    pub async fn restore<R: Read>(&self, source: R) -> Result<()> {
        let (index, entries) = Snapshot::read_from(source)?.into_parts();

        let mut state = self.state.write().await;
        state.index = index;
        state.store.replace_entries(entries);
        Ok(())
    }
}

/// Converts a ttl relative to now into a Unix second, saturating on overflow.
fn expiry_timestamp(ttl: TimeDelta) -> i64 {
    match Utc::now().checked_add_signed(ttl) {
        Some(at) => at.timestamp(),
        None if ttl < TimeDelta::zero() => i64::MIN,
        None => i64::MAX,
    }
}
