//! SQLite-backed relational store.

use super::{RelationalStore, StoreResult};
use crate::error::StoreError;
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};

/// Relational store over a single SQLite connection.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Option<Connection>>,
}

impl SqliteStore {
    /// Connect using a `sqlite://<path>` or `sqlite::memory:` URL.
    pub fn connect(url: &str) -> StoreResult<Self> {
        let conn = if url == "sqlite::memory:" || url == "sqlite://:memory:" {
            Connection::open_in_memory()?
        } else if let Some(path) = url.strip_prefix("sqlite://") {
            if path.is_empty() {
                return Err(StoreError::InvalidUrl {
                    url: url.to_string(),
                    reason: "missing database path".to_string(),
                });
            }
            Connection::open(path)?
        } else {
            let scheme = url.split(':').next().unwrap_or_default();
            return Err(StoreError::UnsupportedScheme {
                scheme: scheme.to_string(),
            });
        };

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::connect("sqlite::memory:")
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run a single-value query, mostly useful in tests.
    pub fn query_i64(&self, sql: &str) -> StoreResult<i64> {
        let guard = self.lock();
        let conn = guard.as_ref().ok_or(StoreError::Closed)?;
        Ok(conn.query_row(sql, [], |row| row.get(0))?)
    }
}

impl RelationalStore for SqliteStore {
    fn execute(&self, sql: &str) -> StoreResult<usize> {
        let guard = self.lock();
        let conn = guard.as_ref().ok_or(StoreError::Closed)?;
        Ok(conn.execute(sql, [])?)
    }

    fn ping(&self) -> StoreResult<bool> {
        Ok(self.query_i64("SELECT 1")? == 1)
    }

    fn generate_schemas(&self, ddl: &str) -> StoreResult<()> {
        let guard = self.lock();
        let conn = guard.as_ref().ok_or(StoreError::Closed)?;
        conn.execute_batch(ddl)?;
        Ok(())
    }

    fn close(&self) -> StoreResult<()> {
        if let Some(conn) = self.lock().take() {
            conn.close().map_err(|(_, e)| StoreError::Sqlite(e))?;
        }
        Ok(())
    }
}
