//! In-memory write queue.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DeferredWrite, WriteQueue};
use crate::error::Result;

/// Queue kept in process memory; lost on restart.
#[derive(Debug, Default)]
pub struct MemoryWriteQueue {
    items: RwLock<Vec<DeferredWrite>>,
}

impl MemoryWriteQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WriteQueue for MemoryWriteQueue {
    async fn enqueue(&self, item: DeferredWrite) -> Result<()> {
        let mut items = self.items.write().await;
        match items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => items.push(item),
        }
        Ok(())
    }

    async fn list_pending(&self) -> Result<Vec<DeferredWrite>> {
        Ok(self.items.read().await.clone())
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|item| item.id != id);
        Ok(items.len() != before)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.items.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_enqueue_and_list_in_order() {
        let queue = MemoryWriteQueue::new();
        let first = DeferredWrite::new(json!({"n": 1}), "t");
        let second = DeferredWrite::new(json!({"n": 2}), "t");
        queue.enqueue(first.clone()).await.unwrap();
        queue.enqueue(second.clone()).await.unwrap();

        let pending = queue.list_pending().await.unwrap();
        assert_eq!(pending, vec![first, second]);
    }

    #[tokio::test]
    async fn test_enqueue_same_id_replaces() {
        let queue = MemoryWriteQueue::new();
        let mut item = DeferredWrite::new(json!({"n": 1}), "t");
        queue.enqueue(item.clone()).await.unwrap();
        item.payload = json!({"n": 2});
        queue.enqueue(item.clone()).await.unwrap();

        assert_eq!(queue.len().await.unwrap(), 1);
        assert_eq!(queue.list_pending().await.unwrap()[0].payload, json!({"n": 2}));
    }

    #[tokio::test]
    async fn test_remove() {
        let queue = MemoryWriteQueue::new();
        let item = DeferredWrite::new(json!({}), "t");
        queue.enqueue(item.clone()).await.unwrap();

        assert!(queue.remove(&item.id).await.unwrap());
        assert!(!queue.remove(&item.id).await.unwrap());
        assert_eq!(queue.len().await.unwrap(), 0);
    }
}
