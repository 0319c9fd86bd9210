//! Install and activate transitions.

use futures::future::join_all;
use serde::Serialize;
use tracing::{error, info, warn};

use super::OfflineController;
use crate::cache::CachedResponse;
use crate::config::InstallMode;
use crate::error::{ControllerError, Result};
use crate::models::FetchRequest;

/// Outcome of pre-caching the asset manifest.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InstallReport {
    pub cache_name: String,
    pub mode: InstallMode,
    /// URLs stored in the current cache
    pub cached: Vec<String>,
    /// Entries that could not be fetched (best-effort mode only)
    pub failed: Vec<InstallFailure>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InstallFailure {
    pub url: String,
    pub reason: String,
}

impl OfflineController {
    // == Install ==
    /// Opens the current store and pre-populates it from the manifest.
    ///
    /// In strict mode any failed entry fails the install and nothing is
    /// stored. In best-effort mode successful entries are stored and
    /// failures are reported.
    pub async fn install(&self) -> Result<InstallReport> {
        self.storage.open(&self.cache_name).await?;
        info!(
            "Installing cache {} ({} manifest entries, {:?})",
            self.cache_name,
            self.manifest.len(),
            self.config.install_mode
        );

        let fetches = self.manifest.iter().map(|url| async move {
            let request = FetchRequest::get(url.clone());
            let outcome = match self.fetcher.fetch(&request).await {
                Ok(response) if response.is_ok() => Ok(CachedResponse::capture(&response)),
                Ok(response) => Err(format!("HTTP {}", response.status)),
                Err(err) => Err(err.to_string()),
            };
            (request, outcome)
        });

        let mut entries = Vec::new();
        let mut failed = Vec::new();
        for (request, outcome) in join_all(fetches).await {
            match outcome {
                Ok(copy) => entries.push((request.cache_key(), copy)),
                Err(reason) => {
                    warn!("Failed to pre-cache {}: {}", request.url, reason);
                    failed.push(InstallFailure {
                        url: request.url.to_string(),
                        reason,
                    });
                }
            }
        }

        if self.config.install_mode == InstallMode::Strict && !failed.is_empty() {
            let summary = failed
                .iter()
                .map(|f| format!("{} ({})", f.url, f.reason))
                .collect::<Vec<_>>()
                .join(", ");
            error!("Install of {} aborted: {}", self.cache_name, summary);
            return Err(ControllerError::Install(summary));
        }

        let cached = entries.iter().map(|(key, _)| key.url.clone()).collect();
        self.storage.put_all(&self.cache_name, entries).await?;
        info!("Opened cache {}", self.cache_name);

        Ok(InstallReport {
            cache_name: self.cache_name.clone(),
            mode: self.config.install_mode,
            cached,
            failed,
        })
    }

    // == Activate ==
    /// Deletes every cache store that does not belong to this version.
    ///
    /// Returns the names of the deleted stores.
    pub async fn activate(&self) -> Result<Vec<String>> {
        let mut deleted = Vec::new();
        for name in self.storage.keys().await? {
            if name == self.cache_name {
                continue;
            }
            info!("Deleting old cache: {}", name);
            if self.storage.delete(&name).await? {
                deleted.push(name);
            }
        }
        Ok(deleted)
    }

    // == Startup ==
    /// Installs, then activates only if the install succeeded. Neither
    /// failure is fatal: the controller keeps serving from whatever stores
    /// exist, and POST /_sw/install can retry later.
    ///
    /// Returns whether the current version was activated.
    pub async fn start(&self) -> bool {
        match self.install().await {
            Ok(report) => info!(
                "Installed {}: {} cached, {} failed",
                report.cache_name,
                report.cached.len(),
                report.failed.len()
            ),
            Err(err) => {
                error!("Install failed, skipping activation: {}", err);
                return false;
            }
        }

        match self.activate().await {
            Ok(deleted) => {
                info!("Activated {} (deleted {:?})", self.cache_name, deleted);
                true
            }
            Err(err) => {
                error!("Activation failed, old caches kept: {}", err);
                false
            }
        }
    }
}
