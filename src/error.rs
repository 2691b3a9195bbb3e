//! Error types for the cache server
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Protocol Error Enum ==
/// A malformed command line. Replied to the client, the connection stays open.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Unknown verb
    #[error("invalid command {0:?}")]
    InvalidCommand(String),

    /// Known verb with the wrong number of parameters
    #[error("{0} insufficient number of params")]
    Arity(&'static str),

    /// `set` ttl that is not a duration literal
    #[error("SET failed to parse ttl")]
    InvalidTtl,

    /// Request line longer than the connection accepts
    #[error("line exceeds {0} bytes")]
    LineTooLong(usize),
}

// == Cache Error Enum ==
/// Unified error type for the cache server.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not present in the store
    #[error("key not found")]
    NotFound,

    /// Malformed command line
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Socket or snapshot file I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot could not be encoded or decoded
    #[error("snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the cache server.
pub type Result<T> = std::result::Result<T, CacheError>;
