//! Cache Statistics Module
//!
//! Tracks serving outcomes and reconciliation activity.

use serde::Serialize;

// == Cache Stats ==
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests answered from the current store
    pub hits: u64,
    /// GET lookups that found nothing
    pub misses: u64,
    /// Network responses copied into the store
    pub network_stores: u64,
    /// Network responses returned without storing
    pub passthroughs: u64,
    /// Network attempts that failed entirely
    pub network_failures: u64,
    /// Failed navigations answered with the offline page
    pub offline_fallbacks: u64,
    /// Synthetic 5xx responses produced
    pub synthetic_responses: u64,
    /// Reconciliation passes executed
    pub sync_passes: u64,
    /// Reconciliation triggers suppressed by the throttle
    pub sync_throttled: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if nothing has been looked up.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_store(&mut self) {
        self.network_stores += 1;
    }

    pub fn record_passthrough(&mut self) {
        self.passthroughs += 1;
    }

    pub fn record_network_failure(&mut self) {
        self.network_failures += 1;
    }

    pub fn record_offline_fallback(&mut self) {
        self.offline_fallbacks += 1;
    }

    pub fn record_synthetic(&mut self) {
        self.synthetic_responses += 1;
    }

    pub fn record_sync_pass(&mut self) {
        self.sync_passes += 1;
    }

    pub fn record_sync_throttled(&mut self) {
        self.sync_throttled += 1;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats, CacheStats::default());
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.sync_passes, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_network_counters() {
        let mut stats = CacheStats::new();
        stats.record_store();
        stats.record_passthrough();
        stats.record_passthrough();
        stats.record_network_failure();
        stats.record_offline_fallback();
        stats.record_synthetic();
        assert_eq!(stats.network_stores, 1);
        assert_eq!(stats.passthroughs, 2);
        assert_eq!(stats.network_failures, 1);
        assert_eq!(stats.offline_fallbacks, 1);
        assert_eq!(stats.synthetic_responses, 1);
    }

    #[test]
    fn test_sync_counters() {
        let mut stats = CacheStats::new();
        stats.record_sync_pass();
        stats.record_sync_throttled();
        stats.record_sync_throttled();
        assert_eq!(stats.sync_passes, 1);
        assert_eq!(stats.sync_throttled, 2);
    }
}
