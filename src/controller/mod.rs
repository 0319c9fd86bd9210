//! Offline Cache Controller
//!
//! Mediates every outgoing request of the client application so it stays
//! usable with degraded connectivity, and replays writes deferred while
//! offline. Each lifecycle hook is a named method:
//!
//! - [`OfflineController::install`] - pre-cache the asset manifest
//! - [`OfflineController::activate`] - purge stores of other versions
//! - [`OfflineController::handle_fetch`] - cache-first serving policy
//! - [`OfflineController::sync`] - throttled reconciliation of deferred writes
//! - [`OfflineController::push`] / [`OfflineController::notification_click`]

mod lifecycle;
mod notify;
mod reconcile;
mod serve;
mod throttle;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use crate::cache::{CacheStats, CacheStorage};
use crate::config::Config;
use crate::error::{ControllerError, Result};
use crate::net::{Fetcher, InterceptorChain, RateLimitInterceptor, RateLimitStats, ResponseInterceptor};
use crate::queue::WriteQueue;

pub use lifecycle::{InstallFailure, InstallReport};
pub use notify::{Notification, NotificationAction, NotificationData, EXPLORE_ACTION};
pub use reconcile::{ReconcileReport, SyncOutcome};
pub use throttle::SyncThrottle;

/// The controller for one deployed client version.
pub struct OfflineController {
    config: Config,
    /// Name of the current cache store
    cache_name: String,
    manifest: Vec<Url>,
    offline_url: Url,
    sync_url: Url,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    queue: Arc<dyn WriteQueue>,
    interceptors: InterceptorChain,
    rate_limit: Arc<RateLimitInterceptor>,
    throttle: SyncThrottle,
    stats: RwLock<CacheStats>,
}

impl OfflineController {
    /// Creates a controller. Manifest, offline page and write endpoint paths
    /// are resolved against the configured origin.
    pub fn new(
        config: Config,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        queue: Arc<dyn WriteQueue>,
    ) -> Result<Self> {
        let resolve = |path: &str| {
            config
                .origin
                .join(path)
                .map_err(|e| ControllerError::Config(format!("cannot resolve '{}': {}", path, e)))
        };

        let manifest = config
            .precache_manifest
            .iter()
            .map(|path| resolve(path))
            .collect::<Result<Vec<_>>>()?;
        let offline_url = resolve(&config.offline_page)?;
        let sync_url = resolve(&config.sync_endpoint)?;

        let rate_limit = Arc::new(RateLimitInterceptor::new());
        let interceptors = InterceptorChain::new().with(rate_limit.clone());

        Ok(Self {
            cache_name: config.cache_name(),
            throttle: SyncThrottle::new(config.sync_min_interval),
            config,
            manifest,
            offline_url,
            sync_url,
            storage,
            fetcher,
            queue,
            interceptors,
            rate_limit,
            stats: RwLock::new(CacheStats::new()),
        })
    }

    /// Appends a response interceptor after the built-in rate-limit detector.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn ResponseInterceptor>) -> Self {
        self.interceptors = self.interceptors.with(interceptor);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    pub fn queue(&self) -> &Arc<dyn WriteQueue> {
        &self.queue
    }

    pub fn throttle(&self) -> &SyncThrottle {
        &self.throttle
    }

    pub fn interceptors(&self) -> &InterceptorChain {
        &self.interceptors
    }

    pub async fn stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }

    pub fn rate_limit_stats(&self) -> RateLimitStats {
        self.rate_limit.stats()
    }

    // == Push ==
    /// Builds the notification to display for a push message.
    pub fn push(&self, payload: Option<&str>) -> Notification {
        Notification::for_push(&self.config.app_name, payload)
    }

    // == Notification Click ==
    /// Route to open for a clicked notification action, if any.
    pub fn notification_click(&self, action: &str) -> Option<String> {
        if action == EXPLORE_ACTION {
            Some(self.config.notification_route.clone())
        } else {
            debug!("Notification action '{}' opens nothing", action);
            None
        }
    }
}

impl std::fmt::Debug for OfflineController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineController")
            .field("cache_name", &self.cache_name)
            .field("manifest", &self.manifest.len())
            .field("interceptors", &self.interceptors)
            .finish()
    }
}
