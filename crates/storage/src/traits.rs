//! Sorted key-value primitive
//!
//! The document layer needs only per-key atomicity from storage: every
//! stored value carries a counter bumped on each successful mutation, and
//! conditional writes compare against it. Keys are ordered by raw byte
//! comparison.
//!
//! Thread safety: implementations must be safe to call concurrently from
//! multiple threads (requires Send + Sync).

use std::sync::Arc;

use folio_core::{Counter, Result, Versioned};

/// Options for opening a cursor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IterOptions {
    /// Walk keys in descending order
    pub reverse: bool,
}

impl IterOptions {
    /// Ascending cursor
    pub fn forward() -> Self {
        IterOptions { reverse: false }
    }

    /// Descending cursor
    pub fn reverse() -> Self {
        IterOptions { reverse: true }
    }
}

/// Ordered byte-key store with per-key counters
pub trait SortedKv: Send + Sync {
    /// Live value and counter at `key`, or None
    fn get(&self, key: &[u8]) -> Result<Option<Versioned<Vec<u8>>>>;

    /// Write unconditionally, returning the new counter
    fn set(&self, key: &[u8], value: Vec<u8>) -> Result<Counter>;

    /// Write only if `key` holds no live value
    ///
    /// Fails with `Error::CasMismatch` if a live value exists.
    fn create(&self, key: &[u8], value: Vec<u8>) -> Result<Counter>;

    /// Delete unconditionally; deleting an absent key is a no-op
    fn delete(&self, key: &[u8]) -> Result<()>;

    /// Write only if the live counter equals `expected`
    ///
    /// Fails with `Error::CasMismatch` on a different counter or no live value.
    fn compare_and_set(&self, key: &[u8], value: Vec<u8>, expected: Counter) -> Result<Counter>;

    /// Delete only if the live counter equals `expected`
    ///
    /// Fails with `Error::CasMismatch` on a different counter or no live value.
    fn compare_and_delete(&self, key: &[u8], expected: Counter) -> Result<()>;

    /// Open a cursor, positioned at the first key of the scan direction
    fn iter(&self, opts: IterOptions) -> Result<Box<dyn KvCursor>>;

    /// Number of live keys
    fn len(&self) -> usize;

    /// True if no live keys exist
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A positioned cursor over a keyspace
///
/// Dropping the cursor releases whatever it holds.
pub trait KvCursor: Send {
    /// True while positioned on an entry
    fn valid(&self) -> bool;

    /// Current key; empty when not valid
    fn key(&self) -> &[u8];

    /// Current value; empty when not valid
    fn value(&self) -> &[u8];

    /// Current counter; zero when not valid
    fn counter(&self) -> Counter;

    /// Step one entry in the scan direction
    fn next(&mut self);

    /// Position on the first entry of the scan direction
    fn rewind(&mut self);

    /// Position on `key`, or on the nearest entry after it in the scan
    /// direction (the next larger key forward, the next smaller reversed)
    fn seek(&mut self, key: &[u8]);
}

/// Source of named keyspaces
pub trait Backend: Send + Sync {
    /// Open (creating if needed) the keyspace called `name`
    fn open_keyspace(&self, name: &str) -> Result<Arc<dyn SortedKv>>;

    /// Drop the keyspace called `name` and everything in it
    fn drop_keyspace(&self, name: &str) -> Result<()>;
}
