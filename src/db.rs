//! SQLite connection wrapper shared by the durable cache storage and the
//! durable write queue.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::error::{ControllerError, Result};

/// One SQLite connection; every statement runs on tokio's blocking pool.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens or creates the database at `path` and applies `schema`.
    pub fn open(path: impl AsRef<Path>, schema: &str) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ControllerError::Storage(format!("Failed to create database directory: {}", e))
            })?;
        }

        let conn = Connection::open(path).map_err(|e| {
            ControllerError::Storage(format!(
                "Failed to open database at {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::with_connection(conn, schema)
    }

    /// Private in-memory database.
    pub fn in_memory(schema: &str) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, schema)
    }

    fn with_connection(conn: Connection, schema: &str) -> Result<Self> {
        conn.execute_batch(schema)
            .map_err(|e| ControllerError::Storage(format!("Failed to run migrations: {}", e)))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `op` with exclusive access to the connection, off the async
    /// worker threads.
    pub async fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|e| ControllerError::Storage(format!("Lock poisoned: {}", e)))?;
            op(&mut guard)
        })
        .await
        .map_err(|e| ControllerError::Storage(format!("database task failed: {}", e)))?
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS t (v INTEGER NOT NULL);";

    #[tokio::test]
    async fn test_run_executes_on_connection() {
        let db = Database::in_memory(SCHEMA).unwrap();
        db.run(|conn| {
            conn.execute("INSERT INTO t (v) VALUES (?1)", [7])?;
            Ok(())
        })
        .await
        .unwrap();

        let v: i64 = db
            .run(|conn| Ok(conn.query_row("SELECT v FROM t", [], |row| row.get(0))?))
            .await
            .unwrap();
        assert_eq!(v, 7);
    }

    #[tokio::test]
    async fn test_run_propagates_errors() {
        let db = Database::in_memory(SCHEMA).unwrap();
        let result = db
            .run(|conn| Ok(conn.execute("INSERT INTO missing (v) VALUES (1)", [])?))
            .await;
        assert!(matches!(result, Err(ControllerError::Storage(_))));
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("x.db");
        Database::open(&path, SCHEMA).unwrap();
        assert!(path.exists());
    }
}
