//! TCP Server Module
//!
//! Accepts client connections and pumps newline-delimited commands through
//! the [`Protocol`]. One task is spawned per connection; on shutdown the
//! listener is closed and every connection task is awaited before
//! [`Server::run`] returns.

mod connection;

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::task::{JoinError, JoinSet};
use tokio::time;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::protocol::Protocol;
use crate::shutdown::Shutdown;

use connection::handle_connection;
pub use connection::MAX_LINE_LEN;

/// Default bounded wait for one `accept` call.
pub const DEFAULT_ACCEPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default idle read timeout per connection.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

// == Server ==
/// Bound TCP listener plus the protocol it serves.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    protocol: Protocol,
    accept_timeout: Duration,
    read_timeout: Duration,
}

impl Server {
    // == Bind ==
    /// Binds a listener on `addr` with the default timeouts.
    pub async fn bind<A: ToSocketAddrs>(addr: A, protocol: Protocol) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            protocol,
            accept_timeout: DEFAULT_ACCEPT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        })
    }

    /// Overrides the accept and idle read timeouts.
    pub fn with_timeouts(mut self, accept_timeout: Duration, read_timeout: Duration) -> Self {
        self.accept_timeout = accept_timeout;
        self.read_timeout = read_timeout;
        self
    }

    /// Returns the address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    // == Run ==
    /// Serves connections until `shutdown` is triggered, then drains every
    /// in-flight connection.
    ///
    /// Accept failures are logged and retried; they never end the loop.
    pub async fn run(self, shutdown: Shutdown) -> Result<()> {
        let Server {
            listener,
            protocol,
            accept_timeout,
            read_timeout,
        } = self;
        let mut connections = JoinSet::new();

        info!("Server listening on {}", listener.local_addr()?);

        loop {
            while let Some(finished) = connections.try_join_next() {
                log_connection_exit(finished);
            }

            let accepted = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                accepted = time::timeout(accept_timeout, listener.accept()) => accepted,
            };

            match accepted {
                // no client within the window; go round to observe shutdown
                Err(_elapsed) => continue,
                Ok(Err(err)) => {
                    warn!(error = %err, "Failed to accept connection");
                }
                Ok(Ok((stream, peer))) => {
                    connections.spawn(handle_connection(
                        stream,
                        peer,
                        protocol.clone(),
                        shutdown.clone(),
                        read_timeout,
                    ));
                }
            }
        }

        drop(listener);
        info!(
            active = connections.len(),
            "Stopped accepting connections, waiting for clients to finish"
        );

        while let Some(finished) = connections.join_next().await {
            log_connection_exit(finished);
        }

        info!("Server shutdown complete");
        Ok(())
    }
}

fn log_connection_exit(result: std::result::Result<(), JoinError>) {
    if let Err(err) = result {
        error!(error = %err, "Connection task failed");
    }
}
