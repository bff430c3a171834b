//! Index diffing
//!
//! Given a document's old and new encoded bytes, compute which
//! (index, index key) pairs appear and which disappear. Each index is
//! diffed on its own field path, so an index over one field of a
//! multi-field document only sees changes to that field.
//!
//! Duplicate values inside one document count once. Comparison is a
//! quadratic scan over the extracted values, which stays cheap because a
//! document yields few values per path.

use serde_json::Value as JsonValue;

use folio_core::codec;
use folio_core::FieldPath;

/// One index mutation: `index_key` of `index` gains or loses the document
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DiffEntry {
    /// Index name
    pub index: String,
    /// Canonical bytes of the extracted value
    pub index_key: Vec<u8>,
}

/// Additions and removals produced by one document change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexDiff {
    /// Values the new document has and the old one lacked
    pub additions: Vec<DiffEntry>,
    /// Values the old document had and the new one lacks
    pub removals: Vec<DiffEntry>,
}

impl IndexDiff {
    /// True if no index changes
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }
}

/// Diff `old` against `new` for every `(name, path)` index
///
/// Either side may be empty (document created or deleted).
pub fn diff_indexes<'a, I>(old: &[u8], new: &[u8], indexes: I) -> IndexDiff
where
    I: IntoIterator<Item = (&'a str, &'a FieldPath)>,
{
    let old_doc = codec::decode_dynamic(old);
    let new_doc = codec::decode_dynamic(new);

    let mut diff = IndexDiff::default();
    for (name, path) in indexes {
        let old_keys = canonical_keys(old_doc.as_ref(), path);
        let new_keys = canonical_keys(new_doc.as_ref(), path);

        diff.additions
            .extend(one_way_diff(&new_keys, &old_keys).map(|key| DiffEntry {
                index: name.to_string(),
                index_key: key.clone(),
            }));
        diff.removals
            .extend(one_way_diff(&old_keys, &new_keys).map(|key| DiffEntry {
                index: name.to_string(),
                index_key: key.clone(),
            }));
    }
    diff
}

/// Distinct canonical keys at `path`, in extraction order
fn canonical_keys(doc: Option<&JsonValue>, path: &FieldPath) -> Vec<Vec<u8>> {
    let Some(doc) = doc else {
        return Vec::new();
    };
    let mut keys: Vec<Vec<u8>> = Vec::new();
    for value in path.extract(doc) {
        let key = codec::index_key(&value);
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// Keys of `a` missing from `b`
fn one_way_diff<'k>(a: &'k [Vec<u8>], b: &'k [Vec<u8>]) -> impl Iterator<Item = &'k Vec<u8>> {
    a.iter().filter(move |key| !b.contains(key))
}
