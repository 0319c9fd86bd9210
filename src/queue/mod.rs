//! Deferred Write Queue
//!
//! Writes made while offline wait here until a reconciliation pass replays
//! them and the server acknowledges. Backends are pluggable through
//! [`WriteQueue`].

mod memory;
mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

pub use memory::MemoryWriteQueue;
pub use sqlite::SqliteWriteQueue;

/// A write submitted while offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeferredWrite {
    pub id: String,
    /// JSON body replayed verbatim
    pub payload: serde_json::Value,
    /// Bearer token of the user who made the write
    pub token: String,
    pub queued_at: DateTime<Utc>,
}

impl DeferredWrite {
    /// Creates a write with a fresh id.
    pub fn new(payload: serde_json::Value, token: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            payload,
            token: token.into(),
            queued_at: Utc::now(),
        }
    }
}

/// Storage for deferred writes.
#[async_trait]
pub trait WriteQueue: Send + Sync {
    /// Adds an item. An existing item with the same id is replaced.
    async fn enqueue(&self, item: DeferredWrite) -> Result<()>;

    /// Every pending item, oldest first.
    async fn list_pending(&self) -> Result<Vec<DeferredWrite>>;

    /// Removes an acknowledged item. Returns false if it was not queued.
    async fn remove(&self, id: &str) -> Result<bool>;

    async fn len(&self) -> Result<usize> {
        Ok(self.list_pending().await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_assigns_unique_ids() {
        let a = DeferredWrite::new(json!({"title": "Trash"}), "tok");
        let b = DeferredWrite::new(json!({"title": "Trash"}), "tok");
        assert_ne!(a.id, b.id);
        assert_eq!(a.token, "tok");
    }

    #[test]
    fn test_serializes_payload_as_json() {
        let item = DeferredWrite::new(json!({"lat": 1.5, "lng": 2.5}), "tok");
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["payload"]["lat"], 1.5);
        assert_eq!(value["token"], "tok");
    }
}
