//! Reconciliation throttle.

use std::sync::Mutex;
use std::time::Duration;

/// Suppresses reconciliation passes that start too soon after the last one.
///
/// Owned by one controller; state is lost on restart.
#[derive(Debug)]
pub struct SyncThrottle {
    min_interval_ms: u64,
    /// Unix milliseconds of the last admitted attempt
    last_attempt: Mutex<Option<u64>>,
}

impl SyncThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval_ms: min_interval.as_millis() as u64,
            last_attempt: Mutex::new(None),
        }
    }

    /// Admits an attempt at `now_ms` and records it, or returns the
    /// milliseconds left until the next attempt is allowed.
    pub fn try_begin(&self, now_ms: u64) -> Result<(), u64> {
        let mut last = self
            .last_attempt
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(previous) = *last {
            let elapsed = now_ms.saturating_sub(previous);
            if elapsed < self.min_interval_ms {
                return Err(self.min_interval_ms - elapsed);
            }
        }
        *last = Some(now_ms);
        Ok(())
    }

    pub fn last_attempt(&self) -> Option<u64> {
        *self
            .last_attempt
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Forgets the last attempt so the next one is admitted.
    pub fn reset(&self) {
        *self
            .last_attempt
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}
