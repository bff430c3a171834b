//! Secondary indexes
//!
//! An index maps each value extracted at its field path to a bucket: the
//! list of primary keys whose document currently yields that value. A
//! bucket is stored as an ordinary counter-versioned entry in the index's
//! own keyspace, keyed by the value's canonical bytes, so bucket changes
//! go through the same compare-and-swap discipline as documents. Empty
//! buckets are deleted, never stored.
//!
//! Bucket maintenance is best-effort. A bucket that is missing, or lacks
//! the key being removed, is logged as corruption and treated as already
//! consistent; a bucket that cannot be decoded is logged and reported.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use folio_core::codec;
use folio_core::{Entry, Error, FieldPath, KeyBound, Result, Versioned};
use folio_storage::SortedKv;

use crate::range::Range;
use crate::retry::RetryPolicy;

/// A secondary index of one table
pub struct Index {
    name: String,
    qualified_name: String,
    path: FieldPath,
    buckets: Arc<dyn SortedKv>,
    documents: Arc<dyn SortedKv>,
    retry: RetryPolicy,
}

impl Index {
    pub(crate) fn new(
        table: &str,
        name: &str,
        path: FieldPath,
        buckets: Arc<dyn SortedKv>,
        documents: Arc<dyn SortedKv>,
        retry: RetryPolicy,
    ) -> Self {
        Index {
            name: name.to_string(),
            qualified_name: folio_core::qualified_index_name(table, name),
            path,
            buckets,
            documents,
            retry,
        }
    }

    /// Index name within its table
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `<table>/<index>`, used in diagnostics
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Field path this index reads
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    // ========== Bucket maintenance ==========

    /// Add `primary_key` to the bucket at `index_key`
    pub(crate) fn add_key(&self, index_key: &[u8], primary_key: &str) -> Result<()> {
        let mut attempts = self.retry.attempts(index_key);
        loop {
            attempts.begin()?;

            let Some(bucket) = self.buckets.get(index_key)? else {
                let data = codec::encode(&[primary_key])?;
                match self.buckets.create(index_key, data) {
                    Err(Error::CasMismatch) => continue,
                    other => return other.map(|_| ()),
                }
            };

            let mut keys = self.decode_bucket(&bucket.value)?;
            if keys.iter().any(|k| k == primary_key) {
                return Ok(());
            }
            keys.push(primary_key.to_string());

            let data = codec::encode(&keys)?;
            match self.buckets.compare_and_set(index_key, data, bucket.counter) {
                Err(Error::CasMismatch) => continue,
                other => return other.map(|_| ()),
            }
        }
    }

    /// Remove `primary_key` from the bucket at `index_key`
    pub(crate) fn remove_key(&self, index_key: &[u8], primary_key: &str) -> Result<()> {
        self.remove_entry(index_key, primary_key, true)
    }

    fn remove_entry(
        &self,
        index_key: &[u8],
        primary_key: &str,
        report_missing: bool,
    ) -> Result<()> {
        let mut attempts = self.retry.attempts(index_key);
        loop {
            attempts.begin()?;

            let Some(bucket) = self.buckets.get(index_key)? else {
                if report_missing {
                    warn!(
                        target: "folio::index",
                        index = %self.qualified_name,
                        key = primary_key,
                        "Corrupt index detected: bucket missing"
                    );
                }
                return Ok(());
            };

            let mut keys = self.decode_bucket(&bucket.value)?;
            let Some(pos) = keys.iter().position(|k| k == primary_key) else {
                if report_missing {
                    warn!(
                        target: "folio::index",
                        index = %self.qualified_name,
                        key = primary_key,
                        "Corrupt index detected: key missing from bucket"
                    );
                }
                return Ok(());
            };
            keys.remove(pos);

            let result = if keys.is_empty() {
                self.buckets.compare_and_delete(index_key, bucket.counter)
            } else {
                let data = codec::encode(&keys)?;
                self.buckets
                    .compare_and_set(index_key, data, bucket.counter)
                    .map(|_| ())
            };
            match result {
                Err(Error::CasMismatch) => continue,
                other => return other,
            }
        }
    }

    /// Make membership of `primary_key` in the bucket at `index_key` match
    /// the document as it is now
    ///
    /// Bucket changes of two writers to the same document can land out of
    /// order, e.g. a later writer's removal before an earlier writer's
    /// addition. Settling recomputes membership from the stored document
    /// and repeats until the document did not move while the bucket was
    /// being changed.
    pub(crate) fn settle(&self, index_key: &[u8], primary_key: &str) -> Result<()> {
        let mut attempts = self.retry.attempts(index_key);
        loop {
            attempts.begin()?;

            let before = self.documents.get(primary_key.as_bytes())?;
            let wanted = before.as_ref().is_some_and(|doc| {
                codec::extract_field_path(&doc.value, &self.path)
                    .iter()
                    .any(|value| codec::index_key(value) == index_key)
            });
            if wanted {
                self.add_key(index_key, primary_key)?;
            } else {
                self.remove_entry(index_key, primary_key, false)?;
            }

            let after = self.documents.get(primary_key.as_bytes())?;
            if after.map(|doc| doc.counter) == before.map(|doc| doc.counter) {
                return Ok(());
            }
        }
    }

    fn decode_bucket(&self, bytes: &[u8]) -> Result<Vec<String>> {
        codec::decode(bytes).map_err(|e| {
            warn!(
                target: "folio::index",
                index = %self.qualified_name,
                error = %e,
                "Corrupt index detected: undecodable bucket"
            );
            e
        })
    }

    // ========== Queries ==========

    /// Primary keys whose document yields `value`, in insertion order
    pub fn keys<V: Serialize + ?Sized>(&self, value: &V) -> Result<Vec<String>> {
        let index_key = codec::index_key_for(value)?;
        self.bucket(&index_key)
    }

    /// Primary keys in the bucket at raw `index_key`
    pub fn bucket(&self, index_key: &[u8]) -> Result<Vec<String>> {
        match self.buckets.get(index_key)? {
            Some(bucket) => self.decode_bucket(&bucket.value),
            None => Ok(Vec::new()),
        }
    }

    /// First live document yielding `value`
    pub fn one<V, T>(&self, value: &V) -> Result<(String, Versioned<T>)>
    where
        V: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        for key in self.keys(value)? {
            if let Some(doc) = self.documents.get(key.as_bytes())? {
                let decoded = codec::decode(&doc.value)?;
                return Ok((key, Versioned::new(decoded, doc.counter)));
            }
        }
        Err(Error::NotFound)
    }

    /// Every live document yielding `value`
    ///
    /// Keys whose document is gone are skipped.
    pub fn get_all<V: Serialize + ?Sized>(&self, value: &V) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        for key in self.keys(value)? {
            if let Some(entry) = self.load(key)? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Documents whose indexed value lies between `lower` and `upper`
    ///
    /// Ordered by canonical index key, then by bucket order; `reverse`
    /// flips both.
    pub fn between(&self, lower: KeyBound, upper: KeyBound, reverse: bool) -> Result<IndexRange> {
        let buckets = Range::open(self.buckets.as_ref(), lower, upper, reverse)?;
        Ok(IndexRange {
            index: self.qualified_name.clone(),
            buckets,
            pending: Vec::new(),
            documents: Arc::clone(&self.documents),
            reverse,
        })
    }

    /// Every indexed document, in index order
    pub fn all(&self, reverse: bool) -> Result<IndexRange> {
        self.between(KeyBound::Min, KeyBound::Max, reverse)
    }

    /// Number of buckets (distinct indexed values)
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn load(&self, key: String) -> Result<Option<Entry>> {
        load_document(self.documents.as_ref(), key)
    }
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("name", &self.qualified_name)
            .field("path", &self.path.to_string())
            .finish()
    }
}

fn load_document(documents: &dyn SortedKv, key: String) -> Result<Option<Entry>> {
    Ok(documents.get(key.as_bytes())?.map(|doc| Entry {
        key: key.into_bytes(),
        value: doc.value,
        counter: doc.counter,
    }))
}

/// Lazy sequence of documents in index order
pub struct IndexRange {
    index: String,
    buckets: Range,
    pending: Vec<String>,
    documents: Arc<dyn SortedKv>,
    reverse: bool,
}

impl Iterator for IndexRange {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // `pending` holds the rest of the current bucket, popped from the back
            while let Some(key) = self.pending.pop() {
                match load_document(self.documents.as_ref(), key) {
                    Ok(Some(entry)) => return Some(Ok(entry)),
                    Ok(None) => continue,
                    Err(e) => return Some(Err(e)),
                }
            }

            let bucket = match self.buckets.next()? {
                Ok(bucket) => bucket,
                Err(e) => return Some(Err(e)),
            };
            let mut keys: Vec<String> = match codec::decode(&bucket.value) {
                Ok(keys) => keys,
                Err(e) => {
                    warn!(
                        target: "folio::index",
                        index = %self.index,
                        error = %e,
                        "Corrupt index detected: undecodable bucket"
                    );
                    return Some(Err(e));
                }
            };
            if !self.reverse {
                keys.reverse();
            }
            self.pending = keys;
        }
    }
}

impl std::fmt::Debug for IndexRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexRange")
            .field("index", &self.index)
            .field("buckets", &self.buckets)
            .field("pending", &self.pending.len())
            .finish()
    }
}
