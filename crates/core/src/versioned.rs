//! Counter-versioned values
//!
//! Every stored value carries a counter: a per-key version bumped by exactly
//! one on every successful mutation of that key. Counters are unrelated
//! across keys. Reads return `Versioned<T>`; writes return the new counter.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::Result;

/// Per-key mutation counter
pub type Counter = u64;

/// A value with the counter of the write that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    /// The actual value
    pub value: T,
    /// Counter of the write that produced `value`
    pub counter: Counter,
}

impl<T> Versioned<T> {
    /// Create a new versioned value
    pub fn new(value: T, counter: Counter) -> Self {
        Versioned { value, counter }
    }

    /// Map the inner value to a new type
    pub fn map<U, F>(self, f: F) -> Versioned<U>
    where
        F: FnOnce(T) -> U,
    {
        Versioned {
            value: f(self.value),
            counter: self.counter,
        }
    }

    /// Consume and return the inner value
    #[inline]
    pub fn into_value(self) -> T {
        self.value
    }

    /// Extract value and counter as a tuple
    pub fn into_parts(self) -> (T, Counter) {
        (self.value, self.counter)
    }
}

/// A document yielded by a range scan: primary key, raw bytes, counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Primary key
    pub key: Vec<u8>,
    /// Encoded document bytes
    pub value: Vec<u8>,
    /// Counter of the document
    pub counter: Counter,
}

impl Entry {
    /// Primary key as UTF-8, lossy
    pub fn key_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.key)
    }

    /// Decode the document bytes into `T`
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        codec::decode(&self.value)
    }

    /// Decode into a versioned value
    pub fn decode_versioned<T: DeserializeOwned>(&self) -> Result<Versioned<T>> {
        Ok(Versioned::new(self.decode()?, self.counter))
    }
}
