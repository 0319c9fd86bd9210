//! Cache Module
//!
//! Versioned response caching: request identity, stored responses, the
//! per-version store and the storage holding every store, in memory or in
//! SQLite.

mod entry;
mod sqlite;
mod stats;
mod storage;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CachedResponse, RequestKey};
pub use sqlite::SqliteCacheStorage;
pub use stats::CacheStats;
pub use storage::{CacheStorage, MemoryCacheStorage};
pub use store::CacheStore;
