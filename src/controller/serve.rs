//! Cache-first serving policy.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use super::OfflineController;
use crate::cache::{CachedResponse, RequestKey};
use crate::error::{ControllerError, Result};
use crate::models::{FetchRequest, FetchResponse};
use crate::queue::DeferredWrite;

impl OfflineController {
    // == Fetch ==
    /// Serves one intercepted request. Never fails: every error, and any
    /// panic in the storage or network layer, becomes a synthetic response.
    pub async fn handle_fetch(&self, request: FetchRequest) -> FetchResponse {
        match AssertUnwindSafe(self.serve(&request)).catch_unwind().await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                error!("Serving {} {} failed: {}", request.method, request.url, err);
                self.synthetic(500, "Service Worker Error").await
            }
            Err(_) => {
                error!("Serving {} {} panicked", request.method, request.url);
                self.synthetic(500, "Service Worker Error").await
            }
        }
    }

    async fn serve(&self, request: &FetchRequest) -> Result<FetchResponse> {
        if request.is_get() {
            let key = request.cache_key();
            if let Some(cached) = self.lookup(&key).await? {
                debug!("Cache hit: {}", key);
                self.stats.write().await.record_hit();
                return Ok(cached.to_response());
            }
            self.stats.write().await.record_miss();
        }

        match self.fetcher.fetch(request).await {
            Ok(mut response) => {
                self.interceptors.apply(request, &mut response);
                self.store_if_cacheable(request, &response).await;
                Ok(response)
            }
            Err(ControllerError::NetworkUnavailable(reason)) => {
                self.offline_response(request, &reason).await
            }
            Err(err) => Err(err),
        }
    }

    /// Looks up the caller's own entry, then for credentialed callers the
    /// entry stored for uncredentialed requests of the same identity.
    async fn lookup(&self, key: &RequestKey) -> Result<Option<CachedResponse>> {
        if let Some(cached) = self.storage.lookup(&self.cache_name, key).await? {
            return Ok(Some(cached));
        }
        if key.partition.is_some() {
            return self.storage.lookup(&self.cache_name, &key.shared()).await;
        }
        Ok(None)
    }

    /// Copies an eligible response into the current store. A failed write
    /// is logged; the caller still gets the network response.
    async fn store_if_cacheable(&self, request: &FetchRequest, response: &FetchResponse) {
        let copy = match CachedResponse::cacheable(request, response) {
            Ok(copy) => copy,
            Err(reason) => {
                debug!("Not caching {} {}: {}", request.method, request.url, reason);
                self.stats.write().await.record_passthrough();
                return;
            }
        };

        match self
            .storage
            .put(&self.cache_name, request.cache_key(), copy)
            .await
        {
            Ok(()) => self.stats.write().await.record_store(),
            Err(err) => warn!("Failed to cache {}: {}", request.url, err),
        }
    }

    async fn offline_response(&self, request: &FetchRequest, reason: &str) -> Result<FetchResponse> {
        warn!("Network unavailable for {} {}: {}", request.method, request.url, reason);
        self.stats.write().await.record_network_failure();
        self.capture_offline_write(request).await;

        if !request.is_navigation() {
            return Ok(self.synthetic(503, "Service Unavailable").await);
        }

        let key = RequestKey::get(&self.offline_url);
        match self.storage.lookup(&self.cache_name, &key).await? {
            Some(page) => {
                self.stats.write().await.record_offline_fallback();
                Ok(page.to_response())
            }
            None => Ok(self.synthetic(503, "Offline").await),
        }
    }

    /// Queues a failed report submission for later replay.
    ///
    /// Only POSTs to the write endpoint carrying a bearer token and a JSON
    /// body are captured. Problems are logged and never change the response.
    async fn capture_offline_write(&self, request: &FetchRequest) {
        if request.method != "POST"
            || request.url.origin() != self.sync_url.origin()
            || request.url.path() != self.sync_url.path()
        {
            return;
        }
        let Some(token) = request.bearer_token() else {
            debug!("Offline write to {} has no bearer token, not queued", request.url);
            return;
        };
        let payload = match request
            .body
            .as_deref()
            .map(|body| serde_json::from_slice::<serde_json::Value>(body))
        {
            Some(Ok(payload)) => payload,
            Some(Err(err)) => {
                warn!("Offline write to {} is not JSON, not queued: {}", request.url, err);
                return;
            }
            None => {
                debug!("Offline write to {} has no body, not queued", request.url);
                return;
            }
        };

        let item = DeferredWrite::new(payload, token);
        let id = item.id.clone();
        match self.queue.enqueue(item).await {
            Ok(()) => info!("Queued offline write {} for background sync", id),
            Err(err) => error!("Failed to queue offline write: {}", err),
        }
    }

    async fn synthetic(&self, status: u16, status_text: &str) -> FetchResponse {
        self.stats.write().await.record_synthetic();
        FetchResponse::synthetic(status, status_text)
    }
}
