//! Application Lifecycle
//!
//! Ties the pieces together for one process run: restore the snapshot, serve
//! until shutdown, then write the final snapshot once every task has stopped.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom};
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};

use crate::cache::CacheEngine;
use crate::config::Config;
use crate::protocol::Protocol;
use crate::server::Server;
use crate::shutdown::Shutdown;
use crate::tasks::{spawn_eviction_task, spawn_signal_listener};

// == App ==
/// A restored cache with its listener bound, ready to run.
#[derive(Debug)]
pub struct App {
    config: Config,
    engine: Arc<CacheEngine>,
    server: Server,
    snapshot: File,
}

impl App {
    // == Start ==
    /// Opens the snapshot file, restores the cache from it and binds the
    /// listener.
    ///
    /// A snapshot that cannot be decoded is logged and the cache starts
    /// empty. Failing to open the file or bind the address is fatal.
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        let mut snapshot = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&config.snapshot_path)
            .with_context(|| {
                format!("Failed to open snapshot file {}", config.snapshot_path.display())
            })?;

        let engine = Arc::new(CacheEngine::new());
        restore_snapshot(&engine, &mut snapshot).await;

        let server = Server::bind(config.listen_addr.as_str(), Protocol::new(engine.clone()))
            .await
            .with_context(|| format!("Failed to start TCP server on {}", config.listen_addr))?
            .with_timeouts(config.accept_timeout, config.read_timeout);

        Ok(Self {
            config,
            engine,
            server,
            snapshot,
        })
    }

    /// Returns the address the listener is bound to.
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.server.local_addr()?)
    }

    pub fn engine(&self) -> &Arc<CacheEngine> {
        &self.engine
    }

    // == Run ==
    /// Runs the server, eviction task and signal listener until `shutdown`
    /// is triggered, waits for all three, then rewrites the snapshot file.
    ///
    /// A failing server triggers shutdown itself; the snapshot is still
    /// written before its error is returned. A failed snapshot write is
    /// returned as an error since the cached data is lost.
    pub async fn run(self, shutdown: Shutdown) -> anyhow::Result<()> {
        let App {
            config,
            engine,
            server,
            mut snapshot,
        } = self;

        let server_task = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                let result = server.run(shutdown.clone()).await;
                if result.is_err() {
                    // stop the other tasks so the snapshot still gets written
                    shutdown.trigger();
                }
                result
            })
        };
        let eviction_task =
            spawn_eviction_task(engine.clone(), config.eviction_interval, shutdown.clone());
        let signal_task = spawn_signal_listener(shutdown.clone());

        let (server_result, eviction_result, signal_result) =
            tokio::join!(server_task, eviction_task, signal_task);

        if let Err(err) = eviction_result {
            error!(error = %err, "Eviction task failed");
        }
        if let Err(err) = signal_result {
            error!(error = %err, "Signal listener failed");
        }
        let server_result = match server_result {
            Ok(result) => result.context("Server failed"),
            Err(err) => Err(err).context("Server task failed"),
        };

        info!("All tasks stopped, writing snapshot");
        persist_snapshot(&engine, &mut snapshot)
            .await
            .with_context(|| {
                format!(
                    "Failed to write snapshot to {}, cached data is lost",
                    config.snapshot_path.display()
                )
            })?;
        info!("Snapshot written to {}", config.snapshot_path.display());

        server_result
    }
}

/// Loads the snapshot into `engine`. Any failure leaves the cache empty and
/// is only logged.
async fn restore_snapshot(engine: &CacheEngine, file: &mut File) {
    if matches!(file.metadata(), Ok(meta) if meta.len() == 0) {
        info!("Snapshot file is empty, starting with an empty cache");
        return;
    }

    match engine.restore(&mut *file).await {
        Ok(()) => {
            let stats = engine.stats().await;
            info!("Cache restored with {} keys", stats.size);
        }
        Err(err) => warn!("Failed to restore cache, starting empty: {}", err),
    }
}

/// Replaces the file contents with a fresh snapshot.
async fn persist_snapshot(engine: &CacheEngine, file: &mut File) -> anyhow::Result<()> {
    file.seek(SeekFrom::Start(0))
        .context("Failed to rewind snapshot file")?;
    file.set_len(0).context("Failed to truncate snapshot file")?;
    engine.dump(&mut *file).await.context("Failed to dump cache")?;
    file.sync_all().context("Failed to sync snapshot file")?;
    Ok(())
}
