//! Core types for folio
//!
//! This crate defines the foundational types used throughout the system:
//! - Error: Error type hierarchy, plus `UpdateError` for read-modify-write
//! - Versioned / Counter / Entry: counter-versioned values
//! - KeyBound: inclusive range bounds with `Min` / `Max` sentinels
//! - FieldPath: paths into structured documents
//! - codec: MessagePack document codec and canonical index keys
//! - name: table and index name rules

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bound;
pub mod codec;
pub mod error;
pub mod name;
pub mod path;
pub mod versioned;

pub use bound::{KeyBound, MAX_BOUNDS, MIN_BOUNDS};
pub use error::{Error, Result, UpdateError};
pub use name::{qualified_index_name, validate_name, MAX_NAME_LENGTH};
pub use path::{FieldPath, PathParseError, PathSegment};
pub use versioned::{Counter, Entry, Versioned};
