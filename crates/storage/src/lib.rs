//! Storage layer for folio
//!
//! This crate defines the sorted key-value primitive the document layer is
//! built on, and an in-memory implementation of it:
//! - SortedKv / KvCursor: byte-ordered store with per-key counters and CAS
//! - Backend: source of named keyspaces
//! - MemoryStore: BTreeMap-based keyspace with RwLock
//! - SnapshotCursor: cursor over a cloned snapshot
//! - MemoryBackend: named MemoryStores

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod memory;
pub mod snapshot;
pub mod stored_value;
pub mod traits;

pub use backend::MemoryBackend;
pub use memory::MemoryStore;
pub use snapshot::SnapshotCursor;
pub use stored_value::StoredValue;
pub use traits::{Backend, IterOptions, KvCursor, SortedKv};
