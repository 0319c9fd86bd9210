//! Background Sync Task
//!
//! Periodically fires the configured sync tag at the controller, standing
//! in for the host's "connectivity restored" signal.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::controller::{OfflineController, SyncOutcome};

/// Spawns a background task that triggers a sync pass every
/// `sync_interval_secs` seconds.
///
/// The controller's throttle still applies, so a short interval only means
/// throttled triggers are skipped more often.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let sync_handle = spawn_sync_task(state.controller.clone(), 60);
/// // Later, during shutdown:
/// sync_handle.abort();
/// ```
pub fn spawn_sync_task(controller: Arc<OfflineController>, sync_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(sync_interval_secs);
    let tag = controller.config().sync_tag.clone();

    tokio::spawn(async move {
        info!(
            "Starting background sync task with interval of {} seconds",
            sync_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            match controller.sync(&tag).await {
                SyncOutcome::Completed(report) => {
                    if let Some(err) = report.error {
                        warn!("Background sync pass failed: {}", err);
                    } else if report.attempted > 0 {
                        info!(
                            "Background sync pass: {}/{} writes replayed",
                            report.replayed.len(),
                            report.attempted
                        );
                    } else {
                        debug!("Background sync pass: queue empty");
                    }
                }
                SyncOutcome::Throttled { retry_in_ms } => {
                    debug!("Background sync throttled for another {}ms", retry_in_ms);
                }
                SyncOutcome::Ignored { .. } => {}
            }
        }
    })
}
