//! minicached - A lightweight in-memory key-value cache
//!
//! Serves a line-oriented TCP protocol with per-key TTL expiry and
//! snapshot persistence to a flat file.

pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod shutdown;
pub mod tasks;

pub use app::App;
pub use cache::CacheEngine;
pub use config::Config;
pub use error::{CacheError, Result};
pub use protocol::Protocol;
pub use server::Server;
pub use shutdown::Shutdown;
pub use tasks::{spawn_eviction_task, spawn_signal_listener};
