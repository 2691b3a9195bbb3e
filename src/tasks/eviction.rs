//! TTL Eviction Task
//!
//! Background task that periodically sweeps expired keys out of the cache.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::CacheEngine;
use crate::shutdown::Shutdown;

/// Spawns a background task that sweeps the cache every `interval`.
///
/// The first sweep runs one full interval after spawning. The task exits at
/// the next tick check after `shutdown` is triggered.
///
/// # Arguments
/// * `engine` - Shared cache engine
/// * `interval` - Time between sweeps (clamped to at least 1ms)
/// * `shutdown` - Token that stops the task
///
/// # Example
/// ```ignore
/// let engine = Arc::new(CacheEngine::new());
/// let shutdown = Shutdown::new();
/// let handle = spawn_eviction_task(engine.clone(), Duration::from_secs(60), shutdown.clone());
/// // Later, during shutdown:
/// shutdown.trigger();
/// handle.await?;
/// ```
pub fn spawn_eviction_task(
    engine: Arc<CacheEngine>,
    interval: Duration,
    shutdown: Shutdown,
) -> JoinHandle<()> {
    let interval = interval.max(Duration::from_millis(1));

    tokio::spawn(async move {
        info!("Starting eviction task with interval of {:?}", interval);

        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let expired = engine.evict_expired().await;

            if expired.is_empty() {
                debug!("Eviction: no expired keys found");
            } else {
                info!("Eviction: swept {} expired keys", expired.len());
            }
        }

        info!("Eviction task stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[tokio::test]
    async fn test_eviction_task_removes_expired_entries() {
        let engine = Arc::new(CacheEngine::new());
        let shutdown = Shutdown::new();

        engine.set("expire_now", "value", TimeDelta::zero()).await;

        let handle = spawn_eviction_task(engine.clone(), Duration::from_millis(50), shutdown.clone());

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(
            engine.get("expire_now").await.is_err(),
            "Expired entry should have been evicted"
        );

        shutdown.trigger();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_eviction_task_preserves_valid_entries() {
        let engine = Arc::new(CacheEngine::new());
        let shutdown = Shutdown::new();

        engine.set("long_lived", "value", TimeDelta::hours(1)).await;

        let handle = spawn_eviction_task(engine.clone(), Duration::from_millis(50), shutdown.clone());

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(engine.get("long_lived").await.unwrap(), "value");

        shutdown.trigger();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_eviction_task_stops_on_shutdown() {
        let engine = Arc::new(CacheEngine::new());
        let shutdown = Shutdown::new();

        let handle = spawn_eviction_task(engine, Duration::from_secs(3600), shutdown.clone());
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("Task should finish after shutdown")
            .unwrap();
    }
}
