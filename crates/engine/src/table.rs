//! Tables: versioned documents with automatically maintained indexes
//!
//! ## Design
//!
//! A table owns one keyspace of documents and a map of indexes. Every
//! document mutation is a compare-and-swap against the document's counter.
//! Once the primary write has succeeded, the table diffs the old and new
//! bytes per index and applies each bucket change on its own. Index
//! failures are logged and never fail the primary write: the document is
//! the unit of success.
//!
//! ## Thread Safety
//!
//! `Table` is `Send + Sync`. Writers never hold a lock across storage
//! calls; correctness under contention comes from the per-key counters
//! alone.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use folio_core::codec;
use folio_core::{Counter, Error, FieldPath, KeyBound, Result, UpdateError, Versioned};
use folio_storage::{Backend, SortedKv};

use crate::diff::diff_indexes;
use crate::index::Index;
use crate::range::Range;
use crate::retry::RetryPolicy;

/// Keyspace holding a table's documents
pub(crate) fn table_keyspace(table: &str) -> String {
    format!("t.{}", hex(table))
}

/// Keyspace holding one index's buckets
pub(crate) fn index_keyspace(table: &str, index: &str) -> String {
    format!("i.{}.{}", hex(table), hex(index))
}

fn hex(name: &str) -> String {
    name.bytes().map(|b| format!("{:02x}", b)).collect()
}

/// A named collection of documents
pub struct Table {
    name: String,
    data: Arc<dyn SortedKv>,
    indexes: RwLock<BTreeMap<String, Arc<Index>>>,
    backend: Arc<dyn Backend>,
    retry: RetryPolicy,
}

impl Table {
    pub(crate) fn open(name: &str, backend: Arc<dyn Backend>, retry: RetryPolicy) -> Result<Self> {
        let data = backend.open_keyspace(&table_keyspace(name))?;
        Ok(Table {
            name: name.to_string(),
            data,
            indexes: RwLock::new(BTreeMap::new()),
            backend,
            retry,
        })
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    // ========== Reads ==========

    /// Document at `key`, decoded as `T`
    ///
    /// Fails with `NotFound` if there is no document and with `Decode` if
    /// the stored bytes do not fit `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Versioned<T>> {
        let raw = self.get_raw(key)?;
        Ok(Versioned::new(codec::decode(&raw.value)?, raw.counter))
    }

    /// Encoded document bytes at `key`
    pub fn get_raw(&self, key: &str) -> Result<Versioned<Vec<u8>>> {
        self.data.get(key.as_bytes())?.ok_or(Error::NotFound)
    }

    /// Number of documents
    pub fn count(&self) -> usize {
        self.data.len()
    }

    // ========== Writes ==========

    /// Write `value` at `key`, returning the new counter
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<Counter> {
        self.write(key, value, None)
    }

    /// Write `value` at `key` only if its counter is still `counter`
    ///
    /// Fails with `CounterChanged` if the document moved on, or does not
    /// exist, and leaves it untouched.
    pub fn set_if<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        counter: Counter,
    ) -> Result<Counter> {
        self.write(key, value, Some(counter))
    }

    fn write<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        expected: Option<Counter>,
    ) -> Result<Counter> {
        let data = codec::encode(value)?;
        let storage_key = key.as_bytes();
        let mut attempts = self.retry.attempts(storage_key);

        loop {
            attempts.begin()?;

            // The prior value feeds the index diff; the CAS below guarantees
            // it is the value actually replaced.
            let prior = self.data.get(storage_key)?;
            let result = match (expected, &prior) {
                (Some(want), Some(prior)) if prior.counter != want => {
                    return Err(Error::CounterChanged)
                }
                (Some(_), None) => return Err(Error::CounterChanged),
                (_, Some(prior)) => {
                    self.data
                        .compare_and_set(storage_key, data.clone(), prior.counter)
                }
                (None, None) => self.data.create(storage_key, data.clone()),
            };

            match result {
                Ok(counter) => {
                    let old = prior.as_ref().map_or(&[][..], |p| p.value.as_slice());
                    self.sync_indexes(key, old, &data, Some(counter));
                    return Ok(counter);
                }
                Err(Error::CasMismatch) if expected.is_some() => {
                    return Err(Error::CounterChanged)
                }
                Err(Error::CasMismatch) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Delete the document at `key`
    ///
    /// Deleting a missing document succeeds and touches no index.
    pub fn delete(&self, key: &str) -> Result<()> {
        self.remove(key, None)
    }

    /// Delete the document at `key` only if its counter is still `counter`
    pub fn delete_if(&self, key: &str, counter: Counter) -> Result<()> {
        self.remove(key, Some(counter))
    }

    fn remove(&self, key: &str, expected: Option<Counter>) -> Result<()> {
        let storage_key = key.as_bytes();
        let mut attempts = self.retry.attempts(storage_key);

        loop {
            attempts.begin()?;

            let Some(prior) = self.data.get(storage_key)? else {
                return Ok(());
            };
            if expected.is_some_and(|want| want != prior.counter) {
                return Err(Error::CounterChanged);
            }

            match self.data.compare_and_delete(storage_key, prior.counter) {
                Ok(()) => {
                    self.sync_indexes(key, &prior.value, &[], None);
                    return Ok(());
                }
                Err(Error::CasMismatch) if expected.is_some() => {
                    return Err(Error::CounterChanged)
                }
                Err(Error::CasMismatch) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Read-modify-write of the document at `key`
    ///
    /// Reads the document, hands it to `modifier`, and installs the result
    /// only if nobody wrote in between; otherwise starts over from a fresh
    /// read. An `Err` from `modifier` aborts without writing and comes back
    /// as `UpdateError::Aborted`.
    ///
    /// ```
    /// use folio_engine::Database;
    ///
    /// let db = Database::in_memory();
    /// let counters = db.create_table("counters").unwrap();
    /// counters.set("hits", &0u64).unwrap();
    ///
    /// counters
    ///     .update("hits", |n: u64| Ok::<_, std::convert::Infallible>(n + 1))
    ///     .unwrap();
    /// assert_eq!(counters.get::<u64>("hits").unwrap().value, 1);
    /// ```
    pub fn update<T, E, F>(
        &self,
        key: &str,
        mut modifier: F,
    ) -> std::result::Result<Counter, UpdateError<E>>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut(T) -> std::result::Result<T, E>,
    {
        let mut attempts = self.retry.attempts(key.as_bytes());
        loop {
            attempts.begin()?;

            let current: Versioned<T> = self.get(key)?;
            let next = modifier(current.value).map_err(UpdateError::Aborted)?;

            match self.set_if(key, &next, current.counter) {
                Err(Error::CounterChanged) => continue,
                other => return other.map_err(UpdateError::Store),
            }
        }
    }

    // ========== Ranges ==========

    /// Documents with keys between `lower` and `upper`, both inclusive
    ///
    /// Either bound may be `KeyBound::Min` / `KeyBound::Max` for "no bound".
    pub fn between(
        &self,
        lower: impl Into<KeyBound>,
        upper: impl Into<KeyBound>,
        reverse: bool,
    ) -> Result<Range> {
        Range::open(self.data.as_ref(), lower.into(), upper.into(), reverse)
    }

    /// Every document, in key order
    pub fn all(&self, reverse: bool) -> Result<Range> {
        self.between(KeyBound::Min, KeyBound::Max, reverse)
    }

    // ========== Indexes ==========

    /// Names of this table's indexes, sorted
    pub fn indexes(&self) -> Vec<String> {
        self.indexes.read().keys().cloned().collect()
    }

    /// Index called `name`, if it exists
    pub fn index(&self, name: &str) -> Option<Arc<Index>> {
        self.indexes.read().get(name).cloned()
    }

    /// Declare an index on `path` and fill it from the current documents
    ///
    /// The index is live for writers before the backfill starts. Each
    /// backfilled entry is settled against the current document, so a
    /// document rewritten during the backfill is not left in a stale
    /// bucket.
    pub fn create_index(&self, name: &str, path: &str) -> Result<Arc<Index>> {
        folio_core::validate_name(name)?;
        let path = FieldPath::parse_field(path)?;

        let index = {
            let mut indexes = self.indexes.write();
            if indexes.contains_key(name) {
                return Err(Error::AlreadyExists(format!("{}/{}", self.name, name)));
            }
            let buckets = self.backend.open_keyspace(&index_keyspace(&self.name, name))?;
            let index = Arc::new(Index::new(
                &self.name,
                name,
                path,
                buckets,
                Arc::clone(&self.data),
                self.retry.clone(),
            ));
            indexes.insert(name.to_string(), Arc::clone(&index));
            index
        };

        let mut backfilled = 0usize;
        for entry in self.all(false)? {
            let entry = entry?;
            let key = entry.key_str();
            let diff = diff_indexes(&[], &entry.value, [(index.name(), index.path())]);
            for addition in diff.additions {
                if let Err(e) = index.settle(&addition.index_key, &key) {
                    warn!(
                        target: "folio::index",
                        index = %index.qualified_name(),
                        key = %key,
                        error = %e,
                        "Backfill failed for document"
                    );
                }
            }
            backfilled += 1;
        }

        info!(
            target: "folio::table",
            index = %index.qualified_name(),
            path = %index.path(),
            documents = backfilled,
            "Index created"
        );
        Ok(index)
    }

    /// Remove the index called `name` and its buckets
    pub fn drop_index(&self, name: &str) -> Result<()> {
        let removed = self.indexes.write().remove(name);
        let Some(index) = removed else {
            return Err(Error::NotFound);
        };
        self.backend
            .drop_keyspace(&index_keyspace(&self.name, name))?;
        info!(target: "folio::table", index = %index.qualified_name(), "Index dropped");
        Ok(())
    }

    /// Drop every keyspace this table owns
    pub(crate) fn destroy(&self) -> Result<()> {
        let indexes: Vec<String> = std::mem::take(&mut *self.indexes.write())
            .into_keys()
            .collect();
        for name in indexes {
            self.backend
                .drop_keyspace(&index_keyspace(&self.name, &name))?;
        }
        self.backend.drop_keyspace(&table_keyspace(&self.name))
    }

    // ========== Index synchronization ==========

    /// Bring every index in line with a document change from `old` to `new`
    ///
    /// `written` is the counter the change produced, `None` for a delete.
    /// Each bucket change runs independently; failures are logged and the
    /// remaining changes still run. If another writer moved the document
    /// on before the buckets were done, the touched buckets are settled
    /// against the current document.
    fn sync_indexes(&self, key: &str, old: &[u8], new: &[u8], written: Option<Counter>) {
        let indexes: BTreeMap<String, Arc<Index>> = self.indexes.read().clone();
        if indexes.is_empty() {
            return;
        }

        let diff = diff_indexes(
            old,
            new,
            indexes.values().map(|index| (index.name(), index.path())),
        );
        if diff.is_empty() {
            return;
        }

        for removal in &diff.removals {
            if let Some(index) = indexes.get(&removal.index) {
                log_index_error(index, key, index.remove_key(&removal.index_key, key));
            }
        }
        for addition in &diff.additions {
            if let Some(index) = indexes.get(&addition.index) {
                log_index_error(index, key, index.add_key(&addition.index_key, key));
            }
        }

        let current = match self.data.get(key.as_bytes()) {
            Ok(current) => current.map(|doc| doc.counter),
            Err(e) => {
                warn!(target: "folio::index", key, error = %e, "Could not recheck document");
                return;
            }
        };
        if current == written {
            return;
        }

        debug!(
            target: "folio::index",
            key,
            written = ?written,
            current = ?current,
            "Document moved during index update, settling buckets"
        );
        for touched in diff.removals.iter().chain(&diff.additions) {
            if let Some(index) = indexes.get(&touched.index) {
                log_index_error(index, key, index.settle(&touched.index_key, key));
            }
        }
    }
}

fn log_index_error(index: &Index, key: &str, result: Result<()>) {
    if let Err(e) = result {
        warn!(
            target: "folio::index",
            index = %index.qualified_name(),
            key,
            error = %e,
            "Error while updating index, index likely corrupt"
        );
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("indexes", &self.indexes())
            .finish()
    }
}
