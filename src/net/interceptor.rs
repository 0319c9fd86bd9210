//! Response Interceptors
//!
//! An ordered middleware chain applied to every network response before the
//! controller decides whether to cache it. Interceptors run in registration
//! order and may inspect or rewrite the response.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::models::{FetchRequest, FetchResponse};

/// Retry delay assumed when a 429 carries no usable `Retry-After`.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Hook run on each network response.
pub trait ResponseInterceptor: Send + Sync {
    fn name(&self) -> &'static str;

    fn on_response(&self, request: &FetchRequest, response: &mut FetchResponse);
}

/// Interceptors applied in the order they were added.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an interceptor; it runs after every one already added.
    pub fn with(mut self, interceptor: Arc<dyn ResponseInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn apply(&self, request: &FetchRequest, response: &mut FetchResponse) {
        for interceptor in &self.interceptors {
            interceptor.on_response(request, response);
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

// == Rate Limit Interceptor ==
/// Snapshot of observed rate limiting.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RateLimitStats {
    /// Number of 429 responses seen
    pub limited: u64,
    /// Retry delay announced by the most recent 429
    pub last_retry_after_secs: Option<u64>,
    pub last_limited_at: Option<DateTime<Utc>>,
    pub last_url: Option<String>,
}

/// Detects HTTP 429 responses and records the announced retry delay.
#[derive(Debug, Default)]
pub struct RateLimitInterceptor {
    stats: Mutex<RateLimitStats>,
}

impl RateLimitInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> RateLimitStats {
        self.stats
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ResponseInterceptor for RateLimitInterceptor {
    fn name(&self) -> &'static str {
        "rate-limit"
    }

    fn on_response(&self, request: &FetchRequest, response: &mut FetchResponse) {
        if response.status != 429 {
            return;
        }

        let retry_after = response
            .header("retry-after")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);

        warn!(
            "Rate limited on {} {}, retry after {}s",
            request.method, request.url, retry_after
        );

        let mut stats = self
            .stats
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        stats.limited += 1;
        stats.last_retry_after_secs = Some(retry_after);
        stats.last_limited_at = Some(Utc::now());
        stats.last_url = Some(request.url.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn request() -> FetchRequest {
        FetchRequest::get(Url::parse("http://app.test/api/reports").unwrap())
    }

    struct Tagger(&'static str);

    impl ResponseInterceptor for Tagger {
        fn name(&self) -> &'static str {
            self.0
        }

        fn on_response(&self, _request: &FetchRequest, response: &mut FetchResponse) {
            response.body.extend_from_slice(self.0.as_bytes());
        }
    }

    #[test]
    fn test_chain_runs_in_registration_order() {
        let chain = InterceptorChain::new()
            .with(Arc::new(Tagger("a")))
            .with(Arc::new(Tagger("b")))
            .with(Arc::new(Tagger("c")));

        let mut response = FetchResponse::new(200, "");
        chain.apply(&request(), &mut response);

        assert_eq!(response.body, b"abc");
        assert_eq!(chain.names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_chain_leaves_response_untouched() {
        let chain = InterceptorChain::new();
        let mut response = FetchResponse::new(200, "body");
        chain.apply(&request(), &mut response);
        assert!(chain.names().is_empty());
        assert_eq!(response.body, b"body");
    }

    #[test]
    fn test_rate_limit_records_retry_after() {
        let interceptor = RateLimitInterceptor::new();
        let mut response = FetchResponse::new(429, "").with_header("Retry-After", "120");
        interceptor.on_response(&request(), &mut response);

        let stats = interceptor.stats();
        assert_eq!(stats.limited, 1);
        assert_eq!(stats.last_retry_after_secs, Some(120));
        assert_eq!(stats.last_url.as_deref(), Some("http://app.test/api/reports"));
        assert!(stats.last_limited_at.is_some());
    }

    #[test]
    fn test_rate_limit_defaults_retry_after() {
        let interceptor = RateLimitInterceptor::new();
        let mut response = FetchResponse::new(429, "");
        interceptor.on_response(&request(), &mut response);
        assert_eq!(
            interceptor.stats().last_retry_after_secs,
            Some(DEFAULT_RETRY_AFTER_SECS)
        );
    }

    #[test]
    fn test_rate_limit_ignores_other_statuses() {
        let interceptor = RateLimitInterceptor::new();
        let mut response = FetchResponse::new(503, "");
        interceptor.on_response(&request(), &mut response);
        assert_eq!(interceptor.stats(), RateLimitStats::default());
    }
}
