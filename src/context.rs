//! Application context.
//!
//! Holds the shared store clients built from resolved settings. The entry
//! point creates it once, hands out references, and closes it on shutdown.

use crate::settings::AppSettings;
use crate::store::{
    KeyValueStore, RelationalStore, SqliteStore, StoreResult, connect_kv, ping_db, ping_kv,
};
use anyhow::{Context, Result};
use tracing::info;

/// Shared resources for the running application.
#[derive(Debug)]
pub struct AppContext {
    pub kv: Box<dyn KeyValueStore>,
    pub db: Box<dyn RelationalStore>,
}

impl AppContext {
    /// Connect the stores described by `settings`.
    ///
    /// `models` holds table DDL; it is applied only when `settings.debug` is
    /// set; production databases are expected to be migrated separately.
    pub fn initialize(settings: &AppSettings, models: &[&str]) -> Result<Self> {
        info!("Initializing application context...");

        let kv_url = settings.kv_url().context("invalid key-value store URL")?;
        let kv = connect_kv(&kv_url, settings.debug)
            .with_context(|| format!("failed to open key-value store at {}", kv_url.scheme()))?;

        let db = SqliteStore::connect(&settings.database_url)
            .context("failed to connect to the database")?;
        if settings.debug && !models.is_empty() {
            info!(count = models.len(), "Generating database schemas...");
            for ddl in models {
                db.generate_schemas(ddl)
                    .context("failed to generate database schema")?;
            }
        }
        info!("Database connection initialized successfully.");

        Ok(Self {
            kv,
            db: Box::new(db),
        })
    }

    /// Build a context from already-open stores.
    pub fn from_parts(kv: Box<dyn KeyValueStore>, db: Box<dyn RelationalStore>) -> Self {
        Self { kv, db }
    }

    pub fn ping_kv(&self) -> bool {
        ping_kv(self.kv.as_ref())
    }

    pub fn ping_db(&self) -> bool {
        ping_db(self.db.as_ref())
    }

    /// Close both stores; the first failure is returned after both were tried.
    pub fn close(self) -> StoreResult<()> {
        info!("Closing application context...");
        let kv = self.kv.close();
        let db = self.db.close();
        kv.and(db)
    }
}
