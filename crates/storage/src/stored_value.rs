//! Storage-layer value wrapper
//!
//! A deleted key keeps its slot as a tombstone so its counter keeps
//! counting: a re-insert after a delete continues the sequence instead of
//! restarting at 1.

use std::sync::Arc;

use folio_core::{Counter, Versioned};

/// A stored value, or a tombstone, with its counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    value: Option<Arc<[u8]>>,
    counter: Counter,
}

impl StoredValue {
    /// Successor of `prev` holding `value`; counter 1 when there is no `prev`
    pub fn after(prev: Option<&StoredValue>, value: Vec<u8>) -> Self {
        StoredValue {
            value: Some(value.into()),
            counter: prev.map_or(0, |p| p.counter) + 1,
        }
    }

    /// Tombstone succeeding this value
    pub fn tombstone(&self) -> Self {
        StoredValue {
            value: None,
            counter: self.counter + 1,
        }
    }

    /// True if this slot holds a value
    #[inline]
    pub fn is_live(&self) -> bool {
        self.value.is_some()
    }

    /// Shared handle on the bytes, if live
    #[inline]
    pub fn bytes(&self) -> Option<&Arc<[u8]>> {
        self.value.as_ref()
    }

    /// Get the counter
    #[inline]
    pub fn counter(&self) -> Counter {
        self.counter
    }

    /// Live value as a contract type
    pub fn versioned(&self) -> Option<Versioned<Vec<u8>>> {
        self.value
            .as_ref()
            .map(|v| Versioned::new(v.to_vec(), self.counter))
    }
}
