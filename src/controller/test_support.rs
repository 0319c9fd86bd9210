//! Fakes shared by the controller unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use url::Url;

use super::OfflineController;
use crate::cache::{CacheStorage, CachedResponse, MemoryCacheStorage, RequestKey};
use crate::config::Config;
use crate::error::{ControllerError, Result};
use crate::models::{FetchRequest, FetchResponse};
use crate::net::Fetcher;
use crate::queue::MemoryWriteQueue;

pub const ORIGIN: &str = "http://app.test";

pub fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

pub fn test_config() -> Config {
    Config {
        origin: Url::parse(ORIGIN).unwrap(),
        precache_manifest: vec!["/".to_string(), "/app.js".to_string(), "/offline.html".to_string()],
        ..Config::default()
    }
}

/// Fetcher answering from a script keyed by URL; unknown URLs are offline.
#[derive(Default)]
pub struct ScriptedFetcher {
    routes: Mutex<HashMap<String, FetchResponse>>,
    calls: Mutex<Vec<FetchRequest>>,
}

impl ScriptedFetcher {
    pub fn respond(&self, path: &str, response: FetchResponse) {
        self.routes
            .lock()
            .unwrap()
            .insert(url(path).to_string(), response);
    }

    pub fn go_offline(&self, path: &str) {
        self.routes.lock().unwrap().remove(url(path).as_str());
    }

    pub fn calls(&self) -> Vec<FetchRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        self.calls.lock().unwrap().push(request.clone());
        self.routes
            .lock()
            .unwrap()
            .get(request.url.as_str())
            .cloned()
            .ok_or_else(|| ControllerError::NetworkUnavailable("connection refused".to_string()))
    }
}

/// Storage that rejects every write and optionally fails or panics on reads.
pub struct BrokenStorage {
    fail_reads: bool,
    panic: bool,
}

impl BrokenStorage {
    pub fn failing_writes() -> Self {
        Self { fail_reads: false, panic: false }
    }

    pub fn failing_reads() -> Self {
        Self { fail_reads: true, panic: false }
    }

    pub fn panicking() -> Self {
        Self { fail_reads: true, panic: true }
    }
}

#[async_trait]
impl CacheStorage for BrokenStorage {
    async fn open(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Err(ControllerError::Storage("keys unavailable".to_string()))
    }

    async fn delete(&self, _name: &str) -> Result<bool> {
        Ok(false)
    }

    async fn lookup(&self, _name: &str, _key: &RequestKey) -> Result<Option<CachedResponse>> {
        if self.panic {
            panic!("cache backend exploded");
        }
        if self.fail_reads {
            return Err(ControllerError::Storage("disk read failed".to_string()));
        }
        Ok(None)
    }

    async fn put(&self, _name: &str, _key: RequestKey, _response: CachedResponse) -> Result<()> {
        Err(ControllerError::Storage("disk full".to_string()))
    }

    async fn put_all(&self, _name: &str, _entries: Vec<(RequestKey, CachedResponse)>) -> Result<()> {
        Err(ControllerError::Storage("disk full".to_string()))
    }

    async fn len(&self, _name: &str) -> Result<usize> {
        Ok(0)
    }
}

pub fn controller_with(
    config: Config,
) -> (OfflineController, Arc<ScriptedFetcher>, Arc<MemoryWriteQueue>) {
    controller_with_storage(config, Arc::new(MemoryCacheStorage::new()))
}

pub fn controller_with_storage(
    config: Config,
    storage: Arc<dyn CacheStorage>,
) -> (OfflineController, Arc<ScriptedFetcher>, Arc<MemoryWriteQueue>) {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let queue = Arc::new(MemoryWriteQueue::new());
    let controller = OfflineController::new(config, storage, fetcher.clone(), queue.clone()).unwrap();
    (controller, fetcher, queue)
}

pub fn controller() -> (OfflineController, Arc<ScriptedFetcher>, Arc<MemoryWriteQueue>) {
    controller_with(test_config())
}
