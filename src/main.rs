//! minicached - A lightweight in-memory key-value cache
//!
//! Process entry point: sets up logging and configuration, then hands over
//! to [`App`] until shutdown.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use minicached::{App, Config, Shutdown};

/// Main entry point for the minicached server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Restore the cache from the snapshot file and bind the listener
/// 4. Run the TCP server, eviction task and signal listener
/// 5. Rewrite the snapshot file once all of them have stopped
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "minicached=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting minicached");

    let config = Config::from_env();
    info!(
        "Configuration loaded: listen_addr={}, snapshot_path={}, eviction_interval={:?}",
        config.listen_addr,
        config.snapshot_path.display(),
        config.eviction_interval
    );

    App::start(config).await?.run(Shutdown::new()).await
}
