//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::protocol::parse_duration;
use crate::server::{DEFAULT_ACCEPT_TIMEOUT, DEFAULT_READ_TIMEOUT};

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:4000";
const DEFAULT_SNAPSHOT_PATH: &str = "data.bin";
const DEFAULT_EVICTION_INTERVAL: Duration = Duration::from_secs(60);

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// TCP listen address
    pub listen_addr: String,
    /// Snapshot file restored at startup and written at shutdown
    pub snapshot_path: PathBuf,
    /// Time between expiry sweeps
    pub eviction_interval: Duration,
    /// Bounded wait for one accept call
    pub accept_timeout: Duration,
    /// Idle read timeout per connection
    pub read_timeout: Duration,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `LISTEN_ADDR` - TCP listen address (default: 127.0.0.1:4000)
    /// - `SNAPSHOT_PATH` - Snapshot file path (default: data.bin)
    /// - `EVICTION_INTERVAL` - Sweep interval as a duration literal (default: 1m)
    /// - `ACCEPT_TIMEOUT` - Accept wait as a duration literal (default: 5s)
    /// - `READ_TIMEOUT` - Idle read timeout as a duration literal (default: 10s)
    ///
    /// Durations that do not parse or are not positive fall back to the default.
    pub fn from_env() -> Self {
        Self {
            listen_addr: env::var("LISTEN_ADDR").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string()),
            snapshot_path: env::var("SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_SNAPSHOT_PATH)),
            eviction_interval: duration_or(
                env::var("EVICTION_INTERVAL").ok(),
                DEFAULT_EVICTION_INTERVAL,
            ),
            accept_timeout: duration_or(env::var("ACCEPT_TIMEOUT").ok(), DEFAULT_ACCEPT_TIMEOUT),
            read_timeout: duration_or(env::var("READ_TIMEOUT").ok(), DEFAULT_READ_TIMEOUT),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            eviction_interval: DEFAULT_EVICTION_INTERVAL,
            accept_timeout: DEFAULT_ACCEPT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

fn duration_or(value: Option<String>, default: Duration) -> Duration {
    value
        .as_deref()
        .and_then(parse_duration)
        .and_then(|delta| delta.to_std().ok())
        .filter(|duration| !duration.is_zero())
        .unwrap_or(default)
}
