//! Ordered range scans over a keyspace
//!
//! A `Range` is a lazy, single-pass sequence of documents between two
//! inclusive bounds. Forward scans seek to the lower bound and stop at the
//! first key above the upper bound; reverse scans seek to the upper bound
//! and stop at the first key below the lower bound. Once the end is
//! reached the cursor is released and the range never yields again.
//! Dropping a range part-way releases the cursor as well.

use serde::de::DeserializeOwned;

use folio_core::{Entry, Error, KeyBound, Result, Versioned};
use folio_storage::{IterOptions, KvCursor, SortedKv};

/// Lazy sequence of documents in key order
pub struct Range {
    cursor: Option<Box<dyn KvCursor>>,
    lower: KeyBound,
    upper: KeyBound,
    reverse: bool,
}

impl Range {
    pub(crate) fn open(
        store: &dyn SortedKv,
        lower: KeyBound,
        upper: KeyBound,
        reverse: bool,
    ) -> Result<Self> {
        let starts_past_end = if reverse {
            upper == KeyBound::Min
        } else {
            lower == KeyBound::Max
        };
        if starts_past_end {
            return Ok(Range {
                cursor: None,
                lower,
                upper,
                reverse,
            });
        }

        let opts = if reverse {
            IterOptions::reverse()
        } else {
            IterOptions::forward()
        };
        let mut cursor = store.iter(opts)?;

        let start = if reverse { &upper } else { &lower };
        match start.as_key() {
            Some(key) => cursor.seek(key),
            None => cursor.rewind(),
        }

        Ok(Range {
            cursor: Some(cursor),
            lower,
            upper,
            reverse,
        })
    }

    /// Next document, or `Err(Error::EndOfRange)` once the range is done
    pub fn try_next(&mut self) -> Result<Entry> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Err(Error::EndOfRange);
        };

        let in_range = cursor.valid()
            && if self.reverse {
                self.lower.admits_from_below(cursor.key())
            } else {
                self.upper.admits_from_above(cursor.key())
            };
        if !in_range {
            self.close();
            return Err(Error::EndOfRange);
        }

        let entry = Entry {
            key: cursor.key().to_vec(),
            value: cursor.value().to_vec(),
            counter: cursor.counter(),
        };
        cursor.next();
        Ok(entry)
    }

    /// Release the cursor; the range yields nothing afterwards
    pub fn close(&mut self) {
        self.cursor = None;
    }

    /// True once the cursor has been released
    pub fn is_closed(&self) -> bool {
        self.cursor.is_none()
    }

    /// Count the documents left, consuming the range
    pub fn count_remaining(self) -> Result<usize> {
        let mut n = 0;
        for entry in self {
            entry?;
            n += 1;
        }
        Ok(n)
    }

    /// Decode every remaining document as `T`, with its key
    pub fn decode_all<T: DeserializeOwned>(self) -> Result<Vec<(String, Versioned<T>)>> {
        self.map(|entry| {
            let entry = entry?;
            let doc = entry.decode_versioned()?;
            Ok((entry.key_str().into_owned(), doc))
        })
        .collect()
    }

    /// Keys of the remaining documents
    pub fn keys(self) -> Result<Vec<String>> {
        self.map(|entry| entry.map(|e| e.key_str().into_owned()))
            .collect()
    }
}

impl Iterator for Range {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.try_next() {
            Ok(entry) => Some(Ok(entry)),
            Err(Error::EndOfRange) => None,
            Err(e) => {
                self.close();
                Some(Err(e))
            }
        }
    }
}

impl std::fmt::Debug for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Range")
            .field("lower", &self.lower)
            .field("upper", &self.upper)
            .field("reverse", &self.reverse)
            .field("closed", &self.is_closed())
            .finish()
    }
}
