//! Signal Listener Task
//!
//! Turns SIGINT/SIGTERM into a shutdown request.

use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::shutdown::Shutdown;

/// Spawns a task that triggers `shutdown` on Ctrl+C or SIGTERM.
///
/// The task also exits, without triggering anything, when shutdown was
/// requested elsewhere. If the signal handlers cannot be installed it
/// triggers shutdown rather than leave the process unstoppable.
pub fn spawn_signal_listener(shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown.cancelled() => {}
            received = wait_for_signal() => {
                match received {
                    Ok(name) => info!("Received {}, initiating shutdown...", name),
                    Err(err) => error!(error = %err, "Failed to install signal handlers, shutting down"),
                }
                shutdown.trigger();
            }
        }
    })
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
    tokio::select! {
        result = signal::ctrl_c() => result.map(|()| "Ctrl+C"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    signal::ctrl_c().await?;
    Ok("Ctrl+C")
}
