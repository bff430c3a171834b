//! MemoryStore: in-memory sorted keyspace with per-key counters
//!
//! This module implements the `SortedKv` trait using:
//! - `BTreeMap<Vec<u8>, StoredValue>` for byte-ordered key storage
//! - `parking_lot::RwLock` for thread-safe access
//! - tombstones that keep a deleted key's counter
//!
//! # Design Notes
//!
//! - **Per-key counters**: the counter of a key starts at 1 and moves by one
//!   on every set, CAS-set, delete and CAS-delete of that key
//! - **Check and write under one lock**: a compare-and-swap reads the
//!   counter and writes under the same write guard, so it is atomic per key
//! - **Cursors on snapshots**: `iter` clones the live entries under a read
//!   guard and walks the copy, as the cloned snapshot view does

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use folio_core::{Counter, Error, Result, Versioned};

use crate::snapshot::{SnapshotCursor, SnapshotItem};
use crate::stored_value::StoredValue;
use crate::traits::{IterOptions, KvCursor, SortedKv};

/// In-memory keyspace
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<Vec<u8>, StoredValue>>,
    open_cursors: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// Create a new empty MemoryStore
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cursors opened on this store and not yet dropped
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    fn write_after(
        data: &mut BTreeMap<Vec<u8>, StoredValue>,
        key: &[u8],
        value: Vec<u8>,
    ) -> Counter {
        let next = StoredValue::after(data.get(key), value);
        let counter = next.counter();
        data.insert(key.to_vec(), next);
        counter
    }

    fn live_counter(data: &BTreeMap<Vec<u8>, StoredValue>, key: &[u8]) -> Option<Counter> {
        data.get(key).filter(|sv| sv.is_live()).map(StoredValue::counter)
    }
}

impl SortedKv for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Versioned<Vec<u8>>>> {
        let data = self.data.read();
        Ok(data.get(key).and_then(StoredValue::versioned))
    }

    fn set(&self, key: &[u8], value: Vec<u8>) -> Result<Counter> {
        let mut data = self.data.write();
        Ok(Self::write_after(&mut data, key, value))
    }

    fn create(&self, key: &[u8], value: Vec<u8>) -> Result<Counter> {
        let mut data = self.data.write();
        if Self::live_counter(&data, key).is_some() {
            return Err(Error::CasMismatch);
        }
        Ok(Self::write_after(&mut data, key, value))
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        let mut data = self.data.write();
        if let Some(sv) = data.get_mut(key) {
            if sv.is_live() {
                *sv = sv.tombstone();
            }
        }
        Ok(())
    }

    fn compare_and_set(&self, key: &[u8], value: Vec<u8>, expected: Counter) -> Result<Counter> {
        let mut data = self.data.write();
        if Self::live_counter(&data, key) != Some(expected) {
            return Err(Error::CasMismatch);
        }
        Ok(Self::write_after(&mut data, key, value))
    }

    fn compare_and_delete(&self, key: &[u8], expected: Counter) -> Result<()> {
        let mut data = self.data.write();
        match data.get_mut(key) {
            Some(sv) if sv.is_live() && sv.counter() == expected => {
                *sv = sv.tombstone();
                Ok(())
            }
            _ => Err(Error::CasMismatch),
        }
    }

    fn iter(&self, opts: IterOptions) -> Result<Box<dyn KvCursor>> {
        let items: Vec<SnapshotItem> = {
            let data = self.data.read();
            data.iter()
                .filter_map(|(key, sv)| {
                    sv.bytes().map(|value| SnapshotItem {
                        key: key.clone(),
                        value: Arc::clone(value),
                        counter: sv.counter(),
                    })
                })
                .collect()
        };
        Ok(Box::new(SnapshotCursor::new(
            items,
            opts.reverse,
            Arc::clone(&self.open_cursors),
        )))
    }

    fn len(&self) -> usize {
        self.data.read().values().filter(|sv| sv.is_live()).count()
    }
}
