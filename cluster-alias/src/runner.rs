//! Periodic synchronization driver.
//!
//! The directory itself never schedules anything. Hosts that want the alias
//! map kept fresh spawn [`run_periodic_sync`] on their tokio runtime.
//!
//! ```rust,ignore
//! let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let handle = tokio::spawn(run_periodic_sync(
//!     directory.clone(),
//!     directory.config().sync_interval(),
//!     shutdown_rx,
//! ));
//!
//! // later
//! shutdown_tx.send(true)?;
//! let stats = handle.await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::directory::AliasDirectory;

/// Interval used in place of a zero interval.
pub const MIN_SYNC_INTERVAL: Duration = Duration::from_secs(1);

/// Counters reported when the periodic driver stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncRunnerStats {
    /// Passes attempted.
    pub passes: u64,
    /// Passes that returned an error.
    pub failures: u64,
}

/// Synchronize `directory` every `interval` until `shutdown` turns true.
///
/// The first pass runs immediately. A failed pass is logged and the next tick
/// starts fresh. Store work runs on the blocking pool. Shutdown is observed
/// between passes, never in the middle of one; dropping the sender also stops
/// the driver. A zero `interval` is replaced by [`MIN_SYNC_INTERVAL`].
pub async fn run_periodic_sync(
    directory: Arc<AliasDirectory>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> SyncRunnerStats {
    let interval = if interval.is_zero() {
        warn!(
            min_interval_ms = MIN_SYNC_INTERVAL.as_millis() as u64,
            "Zero sync interval, using the minimum"
        );
        MIN_SYNC_INTERVAL
    } else {
        interval
    };
    let mut stats = SyncRunnerStats::default();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        interval_ms = interval.as_millis() as u64,
        "Starting alias synchronization"
    );
    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            _ = ticker.tick() => {
                stats.passes += 1;
                let directory = Arc::clone(&directory);
                match tokio::task::spawn_blocking(move || directory.synchronize()).await {
                    Ok(Ok(report)) => {
                        debug!(
                            pass = stats.passes,
                            aliased = report.aliased_identities,
                            "Alias synchronization pass done"
                        );
                    }
                    Ok(Err(err)) => {
                        stats.failures += 1;
                        error!(pass = stats.passes, error = %err, "Alias synchronization failed");
                    }
                    Err(join_err) => {
                        stats.failures += 1;
                        error!(
                            pass = stats.passes,
                            error = %join_err,
                            "Alias synchronization task panicked"
                        );
                    }
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!(passes = stats.passes, failures = stats.failures, "Stopped alias synchronization");
    stats
}
