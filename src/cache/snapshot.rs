//! Snapshot Module
//!
//! Binary encoding of the whole cache state (expiry index plus key-value
//! mapping) used for crash recovery.
//!
//! The index is written as its in-order node list, so encoding never walks
//! the tree recursively and decoding always yields a balanced tree.
//!
//! Decoding is bounded by the size of the encoded input, so a length prefix
//! in a corrupt file fails the decode instead of driving an allocation.

use std::collections::HashMap;
use std::io::{BufWriter, Read, Write};

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheStore, ExpiryIndex, ExpiryRecord};
use crate::error::Result;

/// Borrowed view written by [`write_snapshot`]. Field order must match [`Snapshot`].
#[derive(Serialize)]
struct SnapshotRef<'a> {
    index: Vec<ExpiryRecord>,
    entries: &'a HashMap<String, String>,
}

// == Snapshot ==
/// Decoded cache state.
#[derive(Debug, Default, Deserialize)]
pub struct Snapshot {
    /// Expiry index nodes in ascending timestamp order
    pub index: Vec<ExpiryRecord>,
    /// Key-value mapping
    pub entries: HashMap<String, String>,
}

impl Snapshot {
    // == Read ==
    /// Decodes a snapshot from `source`, reading it to the end first.
    pub fn read_from<R: Read>(mut source: R) -> Result<Self> {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;
        Self::decode(&bytes)
    }

    /// Decodes a snapshot held in memory.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let snapshot: Snapshot = codec().with_limit(bytes.len() as u64).deserialize(bytes)?;
        Ok(snapshot)
    }

    /// Splits the snapshot into a balanced index and the raw mapping.
    pub fn into_parts(self) -> (ExpiryIndex, HashMap<String, String>) {
        (ExpiryIndex::from_records(self.index), self.entries)
    }
}

// == Write ==
/// Encodes `index` and `store` into `sink` as one unit.
pub fn write_snapshot<W: Write>(index: &ExpiryIndex, store: &CacheStore, sink: W) -> Result<()> {
    let view = SnapshotRef {
        index: index.records(),
        entries: store.entries(),
    };

    let mut writer = BufWriter::new(sink);
    codec().serialize_into(&mut writer, &view)?;
    writer.flush()?;
    Ok(())
}

/// Little-endian, fixed-width integers.
fn codec() -> impl Options {
    bincode::DefaultOptions::new().with_fixint_encoding()
}
