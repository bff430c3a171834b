//! Database: the catalog of tables
//!
//! A `Database` owns a storage backend and the set of open tables. Each
//! table, and each of its indexes, lives in its own keyspace on the
//! backend.
//!
//! # Example
//!
//! ```
//! use folio_engine::Database;
//! use serde_json::json;
//!
//! let db = Database::in_memory();
//! let users = db.create_table("users").unwrap();
//! let by_city = users.create_index("by_city", "address.city").unwrap();
//!
//! users.set("ada", &json!({"address": {"city": "London"}})).unwrap();
//! assert_eq!(by_city.keys("London").unwrap(), vec!["ada"]);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use folio_core::{validate_name, Error, Result};
use folio_storage::{Backend, MemoryBackend};

use crate::config::FolioConfig;
use crate::table::Table;

/// Catalog of tables over one storage backend
pub struct Database {
    backend: Arc<dyn Backend>,
    config: FolioConfig,
    tables: RwLock<BTreeMap<String, Arc<Table>>>,
}

impl Database {
    /// Open a database over `backend`
    pub fn new(backend: Arc<dyn Backend>, config: FolioConfig) -> Self {
        info!(
            target: "folio::db",
            max_attempts = ?config.retry.max_attempts,
            "Database opened"
        );
        Database {
            backend,
            config,
            tables: RwLock::new(BTreeMap::new()),
        }
    }

    /// Open a database over a fresh in-memory backend with default config
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()), FolioConfig::default())
    }

    /// Active configuration
    pub fn config(&self) -> &FolioConfig {
        &self.config
    }

    /// Create a table called `name`
    ///
    /// Fails with `BadIdentifier` for empty or over-long names and with
    /// `AlreadyExists` if the table is already open.
    pub fn create_table(&self, name: &str) -> Result<Arc<Table>> {
        validate_name(name)?;

        let mut tables = self.tables.write();
        if tables.contains_key(name) {
            return Err(Error::AlreadyExists(name.to_string()));
        }
        let table = Arc::new(Table::open(
            name,
            Arc::clone(&self.backend),
            self.config.retry.clone(),
        )?);
        tables.insert(name.to_string(), Arc::clone(&table));
        drop(tables);

        info!(target: "folio::db", table = name, "Table created");
        Ok(table)
    }

    /// Table called `name`, if it exists
    pub fn table(&self, name: &str) -> Option<Arc<Table>> {
        self.tables.read().get(name).cloned()
    }

    /// Names of all tables, sorted
    pub fn tables(&self) -> Vec<String> {
        self.tables.read().keys().cloned().collect()
    }

    /// Drop the table called `name` together with its indexes
    ///
    /// Handles to the table held elsewhere stay usable for reads of
    /// whatever they already hold but no longer reach the catalog.
    pub fn drop_table(&self, name: &str) -> Result<()> {
        let removed = self.tables.write().remove(name);
        let Some(table) = removed else {
            return Err(Error::NotFound);
        };
        table.destroy()?;
        info!(target: "folio::db", table = name, "Table dropped");
        Ok(())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("tables", &self.tables())
            .field("config", &self.config)
            .finish()
    }
}
