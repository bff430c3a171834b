//! SnapshotCursor: cursor over a point-in-time copy of a keyspace
//!
//! The cursor copies the live entries when it is opened, so writers never
//! block it and it never observes a torn value. Value bytes are shared
//! (`Arc<[u8]>`), so the copy costs one key clone per entry.
//!
//! Every open cursor is counted on its store; the count drops when the
//! cursor is dropped.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use folio_core::Counter;

use crate::traits::KvCursor;

#[derive(Debug, Clone)]
pub(crate) struct SnapshotItem {
    pub(crate) key: Vec<u8>,
    pub(crate) value: Arc<[u8]>,
    pub(crate) counter: Counter,
}

/// Cursor over a cloned snapshot
#[derive(Debug)]
pub struct SnapshotCursor {
    items: Vec<SnapshotItem>,
    pos: Option<usize>,
    reverse: bool,
    open: Arc<AtomicUsize>,
}

impl SnapshotCursor {
    /// `items` must be sorted ascending by key
    pub(crate) fn new(items: Vec<SnapshotItem>, reverse: bool, open: Arc<AtomicUsize>) -> Self {
        open.fetch_add(1, Ordering::SeqCst);
        let mut cursor = SnapshotCursor {
            items,
            pos: None,
            reverse,
            open,
        };
        cursor.rewind();
        cursor
    }

    fn current(&self) -> Option<&SnapshotItem> {
        self.pos.and_then(|i| self.items.get(i))
    }
}

impl KvCursor for SnapshotCursor {
    fn valid(&self) -> bool {
        self.current().is_some()
    }

    fn key(&self) -> &[u8] {
        self.current().map_or(&[][..], |item| item.key.as_slice())
    }

    fn value(&self) -> &[u8] {
        self.current().map_or(&[][..], |item| &item.value[..])
    }

    fn counter(&self) -> Counter {
        self.current().map_or(0, |item| item.counter)
    }

    fn next(&mut self) {
        self.pos = match self.pos {
            Some(i) if self.reverse => i.checked_sub(1),
            Some(i) if i + 1 < self.items.len() => Some(i + 1),
            _ => None,
        };
    }

    fn rewind(&mut self) {
        self.pos = if self.items.is_empty() {
            None
        } else if self.reverse {
            Some(self.items.len() - 1)
        } else {
            Some(0)
        };
    }

    fn seek(&mut self, key: &[u8]) {
        self.pos = if self.reverse {
            // last entry <= key
            let after = self.items.partition_point(|item| item.key.as_slice() <= key);
            after.checked_sub(1)
        } else {
            // first entry >= key
            let at = self.items.partition_point(|item| item.key.as_slice() < key);
            (at < self.items.len()).then_some(at)
        };
    }
}

impl Drop for SnapshotCursor {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}
