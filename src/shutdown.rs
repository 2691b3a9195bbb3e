//! Shutdown Token
//!
//! One cancellation flag shared by the accept loop, every connection, the
//! eviction task and the signal watcher. Any holder may trigger it; it never
//! resets.

use std::sync::Arc;

use tokio::sync::watch;

/// Cloneable cancellation token backed by a `watch` channel.
#[derive(Debug, Clone)]
pub struct Shutdown {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Shutdown {
    /// Creates an untriggered token.
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Requests shutdown. Idempotent.
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    /// Returns true once shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Completes once shutdown has been requested.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        // errors only once every sender is gone
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
