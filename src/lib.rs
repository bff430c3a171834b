//! FolioDB - versioned document tables with secondary indexes
//!
//! FolioDB stores documents in named tables on top of a sorted key-value
//! store. Every document carries a counter that moves on each write, so
//! callers can do optimistic read-modify-write without locks. Tables can
//! declare indexes on a field path; indexes are kept in step with every
//! write and can be queried by value or by value range.
//!
//! # Quick Start
//!
//! ```
//! use foliodb::{Database, KeyBound};
//! use serde_json::json;
//!
//! let db = Database::in_memory();
//! let posts = db.create_table("posts")?;
//! let by_tag = posts.create_index("tag", "tag")?;
//!
//! posts.set("p1", &json!({"title": "hello", "tag": ["a", "b"]}))?;
//! let counter = posts.get::<serde_json::Value>("p1")?.counter;
//!
//! // Only succeeds if nobody wrote p1 in between
//! posts.set_if("p1", &json!({"title": "hello", "tag": ["b"]}), counter)?;
//!
//! assert!(by_tag.keys("a")?.is_empty());
//! assert_eq!(by_tag.keys("b")?, vec!["p1"]);
//! assert_eq!(posts.between("a", KeyBound::Max, false)?.keys()?, vec!["p1"]);
//! # Ok::<(), foliodb::Error>(())
//! ```
//!
//! # Architecture
//!
//! - `folio-core`: errors, counters, range bounds, field paths and the codec
//! - `folio-storage`: the sorted key-value primitive and its in-memory backend
//! - `folio-engine`: databases, tables, indexes and range cursors

pub use folio_core::{
    codec, Counter, Entry, Error, FieldPath, KeyBound, PathParseError, PathSegment, Result,
    UpdateError, Versioned, MAX_BOUNDS, MAX_NAME_LENGTH, MIN_BOUNDS,
};
pub use folio_engine::{
    Database, FolioConfig, Index, IndexRange, Range, RetryPolicy, Table, CONFIG_FILE_NAME,
};
pub use folio_storage::{Backend, KvCursor, MemoryBackend, MemoryStore, SortedKv};
