//! Range bounds with sentinel markers
//!
//! `KeyBound::Min` and `KeyBound::Max` are distinguished by variant, never
//! by byte value, so no real key can be mistaken for "unbounded".

use serde::Serialize;

use crate::codec;
use crate::error::Result;

/// One end of an inclusive range
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyBound {
    /// Below every key. As a lower bound: no lower check.
    Min,
    /// Above every key. As an upper bound: no upper check.
    Max,
    /// A concrete key, compared by raw bytes
    Key(Vec<u8>),
}

/// Shorthand for [`KeyBound::Min`]
pub const MIN_BOUNDS: KeyBound = KeyBound::Min;
/// Shorthand for [`KeyBound::Max`]
pub const MAX_BOUNDS: KeyBound = KeyBound::Max;

impl KeyBound {
    /// Bound on a concrete key
    pub fn key(key: impl AsRef<[u8]>) -> Self {
        KeyBound::Key(key.as_ref().to_vec())
    }

    /// Bound on the canonical index key of `value`
    pub fn index_value<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(KeyBound::Key(codec::index_key_for(value)?))
    }

    /// The concrete key, if any
    pub fn as_key(&self) -> Option<&[u8]> {
        match self {
            KeyBound::Key(k) => Some(k),
            _ => None,
        }
    }

    /// True if `key` is not below this bound used as a lower bound
    pub fn admits_from_below(&self, key: &[u8]) -> bool {
        match self {
            KeyBound::Min => true,
            KeyBound::Max => false,
            KeyBound::Key(lower) => key >= lower.as_slice(),
        }
    }

    /// True if `key` is not above this bound used as an upper bound
    pub fn admits_from_above(&self, key: &[u8]) -> bool {
        match self {
            KeyBound::Max => true,
            KeyBound::Min => false,
            KeyBound::Key(upper) => key <= upper.as_slice(),
        }
    }
}

impl From<&str> for KeyBound {
    fn from(key: &str) -> Self {
        KeyBound::key(key)
    }
}

impl From<String> for KeyBound {
    fn from(key: String) -> Self {
        KeyBound::Key(key.into_bytes())
    }
}

impl From<&[u8]> for KeyBound {
    fn from(key: &[u8]) -> Self {
        KeyBound::key(key)
    }
}
