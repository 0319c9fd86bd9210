//! SQLite-backed write queue.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::params;

use super::{DeferredWrite, WriteQueue};
use crate::db::Database;
use crate::error::{ControllerError, Result};

/// Schema for the deferred write table.
const QUEUE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS deferred_writes (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    payload TEXT NOT NULL,
    token TEXT NOT NULL,
    queued_at TEXT NOT NULL
);
"#;

/// Durable queue stored in a single SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteWriteQueue {
    db: Database,
}

impl SqliteWriteQueue {
    /// Opens or creates the queue database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            db: Database::open(path, QUEUE_SCHEMA)?,
        })
    }

    /// Queue backed by a private in-memory database.
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            db: Database::in_memory(QUEUE_SCHEMA)?,
        })
    }
}

#[async_trait]
impl WriteQueue for SqliteWriteQueue {
    async fn enqueue(&self, item: DeferredWrite) -> Result<()> {
        let payload = serde_json::to_string(&item.payload)?;
        self.db
            .run(move |conn| {
                conn.execute(
                    "INSERT INTO deferred_writes (id, payload, token, queued_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(id) DO UPDATE SET
                         payload = excluded.payload,
                         token = excluded.token,
                         queued_at = excluded.queued_at",
                    params![item.id, payload, item.token, item.queued_at.to_rfc3339()],
                )?;
                Ok(())
            })
            .await
    }

    async fn list_pending(&self) -> Result<Vec<DeferredWrite>> {
        self.db
            .run(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, payload, token, queued_at FROM deferred_writes ORDER BY seq",
                )?;

                let rows = stmt.query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                })?;

                let mut items = Vec::new();
                for row in rows {
                    let (id, payload, token, queued_at) = row?;
                    let queued_at = DateTime::parse_from_rfc3339(&queued_at)
                        .map(|t| t.with_timezone(&Utc))
                        .map_err(|e| {
                            ControllerError::Storage(format!("bad timestamp for {}: {}", id, e))
                        })?;
                    items.push(DeferredWrite {
                        payload: serde_json::from_str(&payload)?,
                        id,
                        token,
                        queued_at,
                    });
                }
                Ok(items)
            })
            .await
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.db
            .run(move |conn| {
                let removed =
                    conn.execute("DELETE FROM deferred_writes WHERE id = ?1", params![id])?;
                Ok(removed > 0)
            })
            .await
    }

    async fn len(&self) -> Result<usize> {
        self.db
            .run(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM deferred_writes", [], |row| row.get(0))?;
                Ok(count as usize)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_enqueue_list_remove() {
        let queue = SqliteWriteQueue::in_memory().unwrap();
        let first = DeferredWrite::new(json!({"title": "Overflowing bin"}), "t1");
        let second = DeferredWrite::new(json!({"title": "Broken glass"}), "t2");
        queue.enqueue(first.clone()).await.unwrap();
        queue.enqueue(second.clone()).await.unwrap();

        let pending = queue.list_pending().await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, first.id);
        assert_eq!(pending[0].payload, first.payload);
        assert_eq!(pending[1].token, "t2");

        assert!(queue.remove(&first.id).await.unwrap());
        assert!(!queue.remove(&first.id).await.unwrap());
        assert_eq!(queue.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_enqueue_same_id_replaces() {
        let queue = SqliteWriteQueue::in_memory().unwrap();
        let mut item = DeferredWrite::new(json!({"v": 1}), "t");
        queue.enqueue(item.clone()).await.unwrap();
        item.token = "refreshed".to_string();
        queue.enqueue(item.clone()).await.unwrap();

        let pending = queue.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].token, "refreshed");
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("queue.db");
        let item = DeferredWrite::new(json!({"kind": "hazard"}), "tok");

        {
            let queue = SqliteWriteQueue::open(&path).unwrap();
            queue.enqueue(item.clone()).await.unwrap();
        }

        let reopened = SqliteWriteQueue::open(&path).unwrap();
        let pending = reopened.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, item.id);
        assert_eq!(pending[0].payload, json!({"kind": "hazard"}));
    }
}
