//! Deferred write reconciliation.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde::Serialize;
use tracing::{debug, error, info};

use super::OfflineController;
use crate::cache::current_timestamp_ms;
use crate::error::{ControllerError, Result};
use crate::models::FetchRequest;
use crate::queue::DeferredWrite;

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Items found in the queue at the start of the pass
    pub attempted: usize,
    /// Ids acknowledged by the server and removed
    pub replayed: Vec<String>,
    /// Ids left queued for the next pass
    pub failed: Vec<String>,
    /// Set when the pass stopped before replaying anything
    pub error: Option<String>,
}

/// What a sync trigger did.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Tag did not match the configured sync tag
    Ignored { tag: String },
    /// Too soon after the previous pass
    Throttled { retry_in_ms: u64 },
    Completed(ReconcileReport),
}

impl OfflineController {
    // == Sync ==
    /// Handles a "connectivity likely restored" trigger.
    pub async fn sync(&self, tag: &str) -> SyncOutcome {
        self.sync_at(tag, current_timestamp_ms()).await
    }

    /// Same as [`sync`](Self::sync) with an explicit clock reading in Unix
    /// milliseconds.
    pub async fn sync_at(&self, tag: &str, now_ms: u64) -> SyncOutcome {
        if tag != self.config.sync_tag {
            debug!("Ignoring sync with tag '{}'", tag);
            return SyncOutcome::Ignored {
                tag: tag.to_string(),
            };
        }

        if let Err(retry_in_ms) = self.throttle.try_begin(now_ms) {
            debug!("Skipping background sync, next allowed in {}ms", retry_in_ms);
            self.stats.write().await.record_sync_throttled();
            return SyncOutcome::Throttled { retry_in_ms };
        }

        self.stats.write().await.record_sync_pass();
        let report = match AssertUnwindSafe(self.reconcile()).catch_unwind().await {
            Ok(report) => report,
            Err(_) => {
                error!("Background sync panicked");
                ReconcileReport {
                    error: Some(
                        ControllerError::UnexpectedFailure("reconciliation panicked".to_string())
                            .to_string(),
                    ),
                    ..ReconcileReport::default()
                }
            }
        };
        SyncOutcome::Completed(report)
    }

    // == Reconcile ==
    /// Replays every queued write once, ignoring the throttle.
    ///
    /// Failures are isolated per item: a failed item stays queued and the
    /// rest of the batch continues.
    pub async fn reconcile(&self) -> ReconcileReport {
        let pending = match self.queue.list_pending().await {
            Ok(pending) => pending,
            Err(err) => {
                error!("Background sync failed: {}", err);
                return ReconcileReport {
                    error: Some(err.to_string()),
                    ..ReconcileReport::default()
                };
            }
        };

        let mut report = ReconcileReport {
            attempted: pending.len(),
            ..ReconcileReport::default()
        };

        for item in pending {
            let outcome = match self.replay(&item).await {
                Ok(()) => self.queue.remove(&item.id).await.map(|_| ()),
                Err(err) => Err(err),
            };
            match outcome {
                Ok(()) => report.replayed.push(item.id),
                Err(err) => {
                    error!("Failed to sync report: {}", err);
                    report.failed.push(item.id);
                }
            }
        }

        if report.attempted > 0 {
            info!(
                "Background sync: {} replayed, {} still queued",
                report.replayed.len(),
                report.failed.len()
            );
        }
        report
    }

    async fn replay(&self, item: &DeferredWrite) -> Result<()> {
        let item_failure = |reason: String| ControllerError::ReconciliationItemFailure {
            id: item.id.clone(),
            reason,
        };

        let body = serde_json::to_vec(&item.payload).map_err(|e| item_failure(e.to_string()))?;
        let request = FetchRequest::new("POST", self.sync_url.clone())
            .with_header("Content-Type", "application/json")
            .with_header("Authorization", format!("Bearer {}", item.token))
            .with_body(body);

        let mut response = self
            .fetcher
            .fetch(&request)
            .await
            .map_err(|e| item_failure(e.to_string()))?;
        self.interceptors.apply(&request, &mut response);

        if response.is_ok() {
            Ok(())
        } else {
            Err(item_failure(format!("HTTP {}", response.status)))
        }
    }
}
