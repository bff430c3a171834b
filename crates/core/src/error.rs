//! Error types for folio
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use thiserror::Error;

use crate::path::PathParseError;

/// Result type alias for folio operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for folio
#[derive(Debug, Error)]
pub enum Error {
    /// No live document or bucket exists at the key
    #[error("not found")]
    NotFound,

    /// Optimistic-concurrency conflict: the stored counter is not the one the
    /// caller observed
    #[error("counter changed")]
    CounterChanged,

    /// Compare-and-swap mismatch reported by the storage primitive
    #[error("compare-and-swap mismatch")]
    CasMismatch,

    /// Stored bytes could not be decoded into the requested shape
    #[error("decode error: {0}")]
    Decode(String),

    /// A value could not be encoded (unsupported shape)
    #[error("encode error: {0}")]
    Encode(String),

    /// Terminal marker of a range sequence
    #[error("end of range")]
    EndOfRange,

    /// Table or index name is empty or too long
    #[error("bad identifier: {0:?}")]
    BadIdentifier(String),

    /// A table or index with this name already exists
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Field path could not be parsed
    #[error("invalid field path: {0}")]
    InvalidPath(#[from] PathParseError),

    /// A compare-and-swap loop gave up under the configured retry limit
    #[error("retry limit exceeded for key {key:?} after {attempts} attempts")]
    RetryLimitExceeded {
        /// Key (lossy UTF-8) the loop was mutating
        key: String,
        /// Attempts made before giving up
        attempts: u32,
    },

    /// Configuration could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage layer error
    #[error("storage error: {0}")]
    Storage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// True for the optimistic-concurrency conflicts a caller may retry
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::CounterChanged | Error::CasMismatch)
    }

    /// True when the key was absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}

impl From<rmp_serde::decode::Error> for Error {
    fn from(e: rmp_serde::decode::Error) -> Self {
        Error::Decode(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for Error {
    fn from(e: rmp_serde::encode::Error) -> Self {
        Error::Encode(e.to_string())
    }
}

/// Error returned by `Table::update`
///
/// Keeps the modifier's own abort error apart from storage failures so the
/// caller gets it back untouched.
#[derive(Debug, Error)]
pub enum UpdateError<E> {
    /// The modifier asked to abort; nothing was written
    #[error("update aborted: {0}")]
    Aborted(E),

    /// Reading or writing the document failed
    #[error(transparent)]
    Store(#[from] Error),
}

impl<E> UpdateError<E> {
    /// Return the storage error, if this is one
    pub fn into_store(self) -> Option<Error> {
        match self {
            UpdateError::Store(e) => Some(e),
            UpdateError::Aborted(_) => None,
        }
    }
}
