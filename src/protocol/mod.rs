//! Protocol Module
//!
//! Line-oriented text protocol on top of [`CacheEngine`].
//!
//! # Commands
//! - `get <key>` - replies with the value or `key not found`
//! - `set <key> <value> <ttl>` - replies `OK`
//! - `del <key>` - replies `OK`
//! - `stats` - replies `Hit: <n>, Miss: <n>, Size: <n>`
//! - `quit` - replies `Bye` and asks the caller to close the connection

mod command;
mod duration;

use std::sync::Arc;

pub use command::Command;
pub use duration::parse_duration;

use crate::cache::CacheEngine;
use crate::error::Result;

// == Reply ==
/// Outcome of executing one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Blank input, nothing to send
    Empty,
    /// A single reply line
    Line(String),
    /// Client asked to disconnect; send `Bye` and close
    Quit,
}

impl Reply {
    /// Returns the text to send back, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Reply::Empty => None,
            Reply::Line(line) => Some(line),
            Reply::Quit => Some("Bye"),
        }
    }
}

// == Protocol ==
/// Stateless command executor bound to one engine.
#[derive(Debug, Clone)]
pub struct Protocol {
    engine: Arc<CacheEngine>,
}

impl Protocol {
    /// Creates a protocol executor for `engine`.
    pub fn new(engine: Arc<CacheEngine>) -> Self {
        Self { engine }
    }

    /// Returns the engine commands are dispatched to.
    pub fn engine(&self) -> &Arc<CacheEngine> {
        &self.engine
    }

    // == Exec ==
    /// Parses and runs one line.
    ///
    /// `NotFound` and protocol errors are returned as `Err` and are meant to
    /// be written back to the client verbatim.
    pub async fn exec(&self, line: &str) -> Result<Reply> {
        let Some(command) = Command::parse(line)? else {
            return Ok(Reply::Empty);
        };

        let reply = match command {
            Command::Get { key } => Reply::Line(self.engine.get(&key).await?),
            Command::Set { key, value, ttl } => {
                self.engine.set(key, value, ttl).await;
                Reply::Line("OK".to_string())
            }
            Command::Del { key } => {
                self.engine.delete(&key).await;
                Reply::Line("OK".to_string())
            }
            Command::Stats => Reply::Line(self.engine.stats().await.to_string()),
            Command::Quit => Reply::Quit,
        };

        Ok(reply)
    }
}
