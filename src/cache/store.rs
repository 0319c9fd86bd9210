//! Cache Store Module
//!
//! One named, versioned store mapping request identity to a stored response.
//! Entries are overwritten in place; there is no TTL and no eviction.

use std::collections::HashMap;

use crate::cache::{CachedResponse, RequestKey};
use crate::error::{ControllerError, Result};

// == Cache Store ==
#[derive(Debug, Clone)]
pub struct CacheStore {
    /// Store name, e.g. `rashtrackr-v1`
    name: String,
    /// Request identity to stored response
    entries: HashMap<RequestKey, CachedResponse>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // == Put ==
    /// Stores a response, replacing any previous entry for the key.
    ///
    /// Only GET identities may be stored.
    pub fn put(&mut self, key: RequestKey, response: CachedResponse) -> Result<()> {
        if key.method != "GET" {
            return Err(ControllerError::InvalidRequest(format!(
                "cannot store {} in cache '{}': only GET is cacheable",
                key, self.name
            )));
        }
        self.entries.insert(key, response);
        Ok(())
    }

    // == Get ==
    /// Exact-identity lookup. `None` is a cache miss.
    pub fn get(&self, key: &RequestKey) -> Option<&CachedResponse> {
        self.entries.get(key)
    }

    // == Length ==
    /// Returns the current number of entries in the store.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
