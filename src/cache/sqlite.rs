//! SQLite-backed cache storage.
//!
//! Every named store survives restarts, so activating a new version finds
//! and purges the stores left behind by the previous one.

use std::path::Path;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::cache::{CacheStorage, CachedResponse, RequestKey};
use crate::db::Database;
use crate::error::{ControllerError, Result};

/// Schema for named stores and their entries.
///
/// `credential` is the key partition, empty for uncredentialed entries.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cache_stores (
    name TEXT PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS cache_entries (
    store TEXT NOT NULL,
    method TEXT NOT NULL,
    url TEXT NOT NULL,
    credential TEXT NOT NULL DEFAULT '',
    status INTEGER NOT NULL,
    status_text TEXT NOT NULL,
    headers TEXT NOT NULL,
    body BLOB NOT NULL,
    stored_at INTEGER NOT NULL,
    PRIMARY KEY (store, method, url, credential)
);
"#;

/// Durable cache storage in a single SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteCacheStorage {
    db: Database,
}

impl SqliteCacheStorage {
    /// Opens or creates the cache database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            db: Database::open(path, CACHE_SCHEMA)?,
        })
    }

    /// Storage backed by a private in-memory database.
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            db: Database::in_memory(CACHE_SCHEMA)?,
        })
    }
}

fn ensure_get(key: &RequestKey) -> Result<()> {
    if key.method != "GET" {
        return Err(ControllerError::InvalidRequest(format!(
            "cannot store {}: only GET is cacheable",
            key
        )));
    }
    Ok(())
}

fn credential(key: &RequestKey) -> &str {
    key.partition.as_deref().unwrap_or("")
}

fn insert_entry(conn: &Connection, store: &str, key: &RequestKey, response: &CachedResponse) -> Result<()> {
    let headers = serde_json::to_string(&response.headers)?;
    conn.execute(
        "INSERT OR IGNORE INTO cache_stores (name) VALUES (?1)",
        params![store],
    )?;
    conn.execute(
        "INSERT OR REPLACE INTO cache_entries
             (store, method, url, credential, status, status_text, headers, body, stored_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            store,
            key.method,
            key.url,
            credential(key),
            response.status,
            response.status_text,
            headers,
            response.body,
            response.stored_at as i64,
        ],
    )?;
    Ok(())
}

#[async_trait]
impl CacheStorage for SqliteCacheStorage {
    async fn open(&self, name: &str) -> Result<()> {
        let name = name.to_string();
        self.db
            .run(move |conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO cache_stores (name) VALUES (?1)",
                    params![name],
                )?;
                Ok(())
            })
            .await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        self.db
            .run(|conn| {
                let mut stmt = conn.prepare("SELECT name FROM cache_stores ORDER BY name")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(names)
            })
            .await
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let name = name.to_string();
        self.db
            .run(move |conn| {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM cache_entries WHERE store = ?1", params![name])?;
                let removed = tx.execute("DELETE FROM cache_stores WHERE name = ?1", params![name])?;
                tx.commit()?;
                Ok(removed > 0)
            })
            .await
    }

    async fn lookup(&self, name: &str, key: &RequestKey) -> Result<Option<CachedResponse>> {
        let name = name.to_string();
        let key = key.clone();
        self.db
            .run(move |conn| {
                let row = conn
                    .query_row(
                        "SELECT status, status_text, headers, body, stored_at FROM cache_entries
                         WHERE store = ?1 AND method = ?2 AND url = ?3 AND credential = ?4",
                        params![name, key.method, key.url, credential(&key)],
                        |row| {
                            Ok((
                                row.get::<_, u16>(0)?,
                                row.get::<_, String>(1)?,
                                row.get::<_, String>(2)?,
                                row.get::<_, Vec<u8>>(3)?,
                                row.get::<_, i64>(4)?,
                            ))
                        },
                    )
                    .optional()?;

                row.map(|(status, status_text, headers, body, stored_at)| -> Result<CachedResponse> {
                    Ok(CachedResponse {
                        status,
                        status_text,
                        headers: serde_json::from_str(&headers)?,
                        body,
                        stored_at: stored_at as u64,
                    })
                })
                .transpose()
            })
            .await
    }

    async fn put(&self, name: &str, key: RequestKey, response: CachedResponse) -> Result<()> {
        ensure_get(&key)?;
        let name = name.to_string();
        self.db
            .run(move |conn| insert_entry(conn, &name, &key, &response))
            .await
    }

    async fn put_all(&self, name: &str, entries: Vec<(RequestKey, CachedResponse)>) -> Result<()> {
        for (key, _) in &entries {
            ensure_get(key)?;
        }
        let name = name.to_string();
        self.db
            .run(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO cache_stores (name) VALUES (?1)",
                    params![name],
                )?;
                for (key, response) in &entries {
                    insert_entry(&tx, &name, key, response)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
    }

    async fn len(&self, name: &str) -> Result<usize> {
        let name = name.to_string();
        self.db
            .run(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM cache_entries WHERE store = ?1",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(count as usize)
            })
            .await
    }
}
