//! Cache Module
//!
//! Provides the in-memory key-value cache with TTL expiry and snapshot persistence.

mod engine;
mod expiry;
mod snapshot;
mod stats;
mod store;


// Re-export public types
pub use engine::CacheEngine;
pub use expiry::{ExpiryIndex, ExpiryRecord};
pub use snapshot::{write_snapshot, Snapshot};
pub use stats::{CacheStats, Counters};
pub use store::CacheStore;
