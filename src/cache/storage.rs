//! Cache Storage Module
//!
//! The set of named cache stores, enumerable and individually deletable.
//! `CacheStorage` is the seam the controller talks to; `MemoryCacheStorage`
//! keeps every store in process memory.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::{CacheStore, CachedResponse, RequestKey};
use crate::error::{ControllerError, Result};

/// Backend holding all named cache stores.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Opens a store, creating it if absent.
    async fn open(&self, name: &str) -> Result<()>;

    /// Names of every existing store.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Deletes a whole store. Returns false if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Looks up one entry in the named store. A missing store is a miss.
    async fn lookup(&self, name: &str, key: &RequestKey) -> Result<Option<CachedResponse>>;

    /// Stores one entry, creating the store if needed.
    async fn put(&self, name: &str, key: RequestKey, response: CachedResponse) -> Result<()>;

    /// Stores every entry or none of them.
    async fn put_all(&self, name: &str, entries: Vec<(RequestKey, CachedResponse)>) -> Result<()>;

    /// Number of entries in the named store (0 if absent).
    async fn len(&self, name: &str) -> Result<usize>;
}

/// In-memory cache storage.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    stores: RwLock<BTreeMap<String, CacheStore>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<()> {
        let mut stores = self.stores.write().await;
        stores
            .entry(name.to_string())
            .or_insert_with(|| CacheStore::new(name));
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.stores.read().await.keys().cloned().collect())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        Ok(self.stores.write().await.remove(name).is_some())
    }

    async fn lookup(&self, name: &str, key: &RequestKey) -> Result<Option<CachedResponse>> {
        let stores = self.stores.read().await;
        Ok(stores.get(name).and_then(|store| store.get(key)).cloned())
    }

    async fn put(&self, name: &str, key: RequestKey, response: CachedResponse) -> Result<()> {
        let mut stores = self.stores.write().await;
        stores
            .entry(name.to_string())
            .or_insert_with(|| CacheStore::new(name))
            .put(key, response)
    }

    async fn put_all(&self, name: &str, entries: Vec<(RequestKey, CachedResponse)>) -> Result<()> {
        if let Some((key, _)) = entries.iter().find(|(key, _)| key.method != "GET") {
            return Err(ControllerError::InvalidRequest(format!(
                "cannot store {}: only GET is cacheable",
                key
            )));
        }

        // Validated above, so every put below succeeds.
        let mut stores = self.stores.write().await;
        let store = stores
            .entry(name.to_string())
            .or_insert_with(|| CacheStore::new(name));
        for (key, response) in entries {
            store.put(key, response)?;
        }
        Ok(())
    }

    async fn len(&self, name: &str) -> Result<usize> {
        let stores = self.stores.read().await;
        Ok(stores.get(name).map(CacheStore::len).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FetchResponse;
    use url::Url;

    fn key(path: &str) -> RequestKey {
        RequestKey::get(&Url::parse("http://app.test").unwrap().join(path).unwrap())
    }

    fn cached(body: &str) -> CachedResponse {
        CachedResponse::capture(&FetchResponse::new(200, body))
    }

    #[tokio::test]
    async fn test_open_creates_empty_store() {
        let storage = MemoryCacheStorage::new();
        storage.open("v1").await.unwrap();
        storage.open("v1").await.unwrap();

        assert_eq!(storage.keys().await.unwrap(), vec!["v1".to_string()]);
        assert_eq!(storage.len("v1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_put_and_lookup_are_scoped_by_store() {
        let storage = MemoryCacheStorage::new();
        storage.put("v1", key("/"), cached("old")).await.unwrap();
        storage.put("v2", key("/"), cached("new")).await.unwrap();

        let v1 = storage.lookup("v1", &key("/")).await.unwrap().unwrap();
        let v2 = storage.lookup("v2", &key("/")).await.unwrap().unwrap();
        assert_eq!(v1.body, b"old");
        assert_eq!(v2.body, b"new");
        assert!(storage.lookup("v3", &key("/")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_store() {
        let storage = MemoryCacheStorage::new();
        storage.put("v1", key("/"), cached("x")).await.unwrap();

        assert!(storage.delete("v1").await.unwrap());
        assert!(!storage.delete("v1").await.unwrap());
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_all_is_all_or_nothing() {
        let storage = MemoryCacheStorage::new();
        let post = RequestKey::new("POST", &Url::parse("http://app.test/api").unwrap());
        let entries = vec![(key("/a"), cached("a")), (post, cached("b"))];

        assert!(storage.put_all("v1", entries).await.is_err());
        assert_eq!(storage.len("v1").await.unwrap(), 0);

        let entries = vec![(key("/a"), cached("a")), (key("/b"), cached("b"))];
        storage.put_all("v1", entries).await.unwrap();
        assert_eq!(storage.len("v1").await.unwrap(), 2);
    }
}
