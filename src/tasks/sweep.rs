//! Throttle Sweep Task
//!
//! Background task that periodically removes idle client limiter records.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::throttle::ThrottleStore;

/// Spawns a background task that periodically evicts idle clients from the
/// throttle store.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps. Each sweep takes the write lock briefly, so admission
/// checks and eviction never mutate the same record concurrently.
///
/// # Arguments
/// * `store` - shared reference to the throttle store
/// * `interval` - time between sweep runs
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
pub fn spawn_sweep_task(store: Arc<RwLock<ThrottleStore>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "starting throttle sweep task");

        loop {
            // Sleep for the configured interval
            tokio::time::sleep(interval).await;

            // Acquire write lock and evict idle clients
            let removed = {
                let mut store_guard = store.write().await;
                store_guard.sweep()
            };

            if removed > 0 {
                info!(removed, "throttle sweep: evicted idle clients");
            } else {
                debug!("throttle sweep: no idle clients");
            }
        }
    })
}
