//! Named keyspaces backed by `MemoryStore`

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use folio_core::Result;

use crate::memory::MemoryStore;
use crate::traits::{Backend, SortedKv};

/// Backend keeping every keyspace in memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    keyspaces: RwLock<HashMap<String, Arc<MemoryStore>>>,
}

impl MemoryBackend {
    /// Create a backend with no keyspaces
    pub fn new() -> Self {
        Self::default()
    }

    /// Concrete handle on an open keyspace
    pub fn store(&self, name: &str) -> Option<Arc<MemoryStore>> {
        self.keyspaces.read().get(name).cloned()
    }

    /// Names of open keyspaces, sorted
    pub fn keyspace_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.keyspaces.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Backend for MemoryBackend {
    fn open_keyspace(&self, name: &str) -> Result<Arc<dyn SortedKv>> {
        let mut keyspaces = self.keyspaces.write();
        let store = keyspaces
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(target: "folio::storage", keyspace = name, "Keyspace created");
                Arc::new(MemoryStore::new())
            })
            .clone();
        Ok(store)
    }

    fn drop_keyspace(&self, name: &str) -> Result<()> {
        if self.keyspaces.write().remove(name).is_some() {
            debug!(target: "folio::storage", keyspace = name, "Keyspace dropped");
        }
        Ok(())
    }
}
