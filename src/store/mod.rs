//! Store clients consumed by the application context.
//!
//! The key-value and relational stores are opaque collaborators: the
//! application only needs to connect, ping, run statements and close.

mod memory;
mod sqlite;

pub use memory::{LoggedKv, MemoryKv};
pub use sqlite::SqliteStore;

use crate::error::StoreError;
use std::fmt;
use tracing::{error, warn};
use url::Url;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Minimal key-value store contract.
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    fn ping(&self) -> StoreResult<bool>;
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn close(&self) -> StoreResult<()>;
}

/// Minimal relational store contract.
pub trait RelationalStore: Send + Sync + fmt::Debug {
    /// Run one statement, returning the number of affected rows.
    fn execute(&self, sql: &str) -> StoreResult<usize>;
    fn ping(&self) -> StoreResult<bool>;
    /// Create tables from DDL statements.
    fn generate_schemas(&self, ddl: &str) -> StoreResult<()>;
    fn close(&self) -> StoreResult<()>;
}

/// Open a key-value client for `url`, tracing every call when `debug` is set.
///
/// `redis://` and `rediss://` URLs are served by the in-process store; values
/// do not outlive the process.
pub fn connect_kv(url: &Url, debug: bool) -> StoreResult<Box<dyn KeyValueStore>> {
    match url.scheme() {
        "memory" => {}
        "redis" | "rediss" => {
            warn!(
                host = url.host_str().unwrap_or_default(),
                "No Redis client available, using the in-process key-value store"
            );
        }
        scheme => {
            return Err(StoreError::UnsupportedScheme {
                scheme: scheme.to_string(),
            });
        }
    }

    let store = MemoryKv::new();
    if debug {
        Ok(Box::new(LoggedKv::new(store, "kv.debug")))
    } else {
        Ok(Box::new(store))
    }
}

/// Ping a key-value store, reporting failure as `false`.
pub fn ping_kv(store: &dyn KeyValueStore) -> bool {
    match store.ping() {
        Ok(alive) => alive,
        Err(e) => {
            error!(error = %e, "Key-value ping failed");
            false
        }
    }
}

/// Ping a relational store, reporting failure as `false`.
pub fn ping_db(store: &dyn RelationalStore) -> bool {
    match store.ping() {
        Ok(alive) => alive,
        Err(e) => {
            error!(error = %e, "Database ping failed");
            false
        }
    }
}
