//! Response DTOs for the control endpoints
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::net::RateLimitStats;

/// Response body for POST /_sw/activate
#[derive(Debug, Clone, Serialize)]
pub struct ActivateResponse {
    /// Store that remains
    pub current: String,
    /// Stores that were deleted
    pub deleted: Vec<String>,
}

/// Response body for POST /_sw/notificationclick
#[derive(Debug, Clone, Serialize)]
pub struct NotificationClickResponse {
    /// Route to open, if any
    pub open: Option<String>,
}

/// Response body for GET /_sw/stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub cache_name: String,
    /// Entries in the current store
    pub cached_entries: usize,
    /// Deferred writes waiting for replay
    pub pending_writes: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    pub serving: CacheStats,
    pub rate_limit: RateLimitStats,
}

impl StatsResponse {
    pub fn new(
        cache_name: impl Into<String>,
        cached_entries: usize,
        pending_writes: usize,
        serving: CacheStats,
        rate_limit: RateLimitStats,
    ) -> Self {
        Self {
            cache_name: cache_name.into(),
            cached_entries,
            pending_writes,
            hit_rate: serving.hit_rate(),
            serving,
            rate_limit,
        }
    }
}

/// Response body for GET /_sw/health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_response_hit_rate() {
        let mut serving = CacheStats::new();
        serving.record_hit();
        serving.record_miss();
        let response = StatsResponse::new("v1", 3, 1, serving, RateLimitStats::default());
        assert_eq!(response.hit_rate, 0.5);
        assert_eq!(response.cached_entries, 3);
        assert_eq!(response.pending_writes, 1);
    }

    #[test]
    fn test_health_response() {
        let response = HealthResponse::healthy();
        assert_eq!(response.status, "healthy");
        assert!(!response.timestamp.is_empty());
    }

    #[test]
    fn test_notification_click_serializes_null() {
        let json = serde_json::to_string(&NotificationClickResponse { open: None }).unwrap();
        assert_eq!(json, r#"{"open":null}"#);
    }
}
