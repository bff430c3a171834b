//! Document engine for folio
//!
//! This crate builds tables of versioned documents on the storage layer:
//! - Database: catalog of tables over one backend
//! - Table: get / set / delete / update with optimistic concurrency
//! - Index: secondary indexes kept in step with every document write
//! - Range: cursors over key ranges of a table or an index
//! - FolioConfig / RetryPolicy: `folio.toml` and compare-and-swap retry
//!
//! Writers never take locks across storage calls. Every mutation is a
//! compare-and-swap on a per-key counter, retried when another writer got
//! there first.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod database;
pub mod diff;
pub mod index;
pub mod range;
pub mod retry;
pub mod table;

pub use config::{FolioConfig, CONFIG_FILE_NAME};
pub use database::Database;
pub use diff::{diff_indexes, DiffEntry, IndexDiff};
pub use index::{Index, IndexRange};
pub use range::Range;
pub use retry::RetryPolicy;
pub use table::Table;
