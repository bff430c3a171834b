//! Field paths into encoded documents
//!
//! A `FieldPath` names the location an index reads from a document. Paths
//! are composed of key segments (object property access) and index
//! segments (array element access).
//!
//! # Path Syntax
//!
//! | Syntax | Meaning | Example |
//! |--------|---------|---------|
//! | `key` | Object property | `tag` |
//! | `.key1.key2` | Nested property | `.user.name` |
//! | `key[n]` | Property then index | `items[0]` |
//!
//! # Extraction
//!
//! Extraction yields zero or more values. Arrays met before a key segment
//! fan out over their elements, and a terminal array is flattened one
//! level, so the path `tags` over `{"tags": ["a", "b"]}` yields `"a"` and
//! `"b"`, and `items.sku` over `{"items": [{"sku": 1}, {"sku": 2}]}`
//! yields `1` and `2`.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for field path parsing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathParseError {
    /// Empty key in path
    #[error("empty key in path at position {0}")]
    EmptyKey(usize),
    /// Unclosed bracket
    #[error("unclosed bracket starting at position {0}")]
    UnclosedBracket(usize),
    /// Invalid array index
    #[error("invalid array index at position {0}: {1}")]
    InvalidIndex(usize, String),
    /// Unexpected character
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
    /// Path has no segments where one is required
    #[error("path must name at least one field")]
    Root,
}

/// A segment in a field path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    /// Object key: `.foo`
    Key(String),
    /// Array index: `[0]`
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, ".{}", k),
            PathSegment::Index(i) => write!(f, "[{}]", i),
        }
    }
}

/// A path into a structured document
///
/// ```
/// use folio_core::FieldPath;
///
/// let path: FieldPath = "user.emails[0]".parse().unwrap();
/// assert_eq!(path, FieldPath::root().key("user").key("emails").index(0));
/// assert_eq!(path.to_string(), "user.emails[0]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Create the root path (empty path)
    pub fn root() -> Self {
        FieldPath {
            segments: Vec::new(),
        }
    }

    /// Parse a path that must name at least one field
    pub fn parse_field(s: &str) -> Result<Self, PathParseError> {
        let path: FieldPath = s.parse()?;
        if path.is_root() {
            return Err(PathParseError::Root);
        }
        Ok(path)
    }

    /// Get the path segments
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Check if this is the root path
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a key segment (builder pattern)
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Key(key.into()));
        self
    }

    /// Append an index segment (builder pattern)
    pub fn index(mut self, idx: usize) -> Self {
        self.segments.push(PathSegment::Index(idx));
        self
    }

    /// Collect every value reachable at this path
    pub fn extract(&self, doc: &JsonValue) -> Vec<JsonValue> {
        let mut out = Vec::new();
        collect(doc, &self.segments, &mut out);
        out
    }

    /// Convert the path to its string form (no leading dot)
    pub fn to_path_string(&self) -> String {
        let mut result = String::new();
        for segment in &self.segments {
            result.push_str(&segment.to_string());
        }
        if result.starts_with('.') {
            result.remove(0);
        }
        result
    }
}

fn collect(current: &JsonValue, segments: &[PathSegment], out: &mut Vec<JsonValue>) {
    let Some((first, rest)) = segments.split_first() else {
        match current {
            JsonValue::Array(items) => out.extend(items.iter().cloned()),
            other => out.push(other.clone()),
        }
        return;
    };

    match (first, current) {
        (PathSegment::Key(key), JsonValue::Object(obj)) => {
            if let Some(next) = obj.get(key) {
                collect(next, rest, out);
            }
        }
        (PathSegment::Key(_), JsonValue::Array(items)) => {
            for item in items {
                collect(item, segments, out);
            }
        }
        (PathSegment::Index(idx), JsonValue::Array(items)) => {
            if let Some(next) = items.get(*idx) {
                collect(next, rest, out);
            }
        }
        _ => {}
    }
}

impl FromStr for FieldPath {
    type Err = PathParseError;

    /// Parse a path from a string
    ///
    /// Supported syntax:
    /// - `foo` or `.foo` - object key
    /// - `[0]` - array index
    /// - `foo.bar` - nested keys
    /// - `foo[0].bar` - mixed
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(FieldPath::root());
        }

        let mut segments = Vec::new();
        let chars: Vec<char> = s.chars().collect();
        let mut i = 0;

        if chars[i] == '.' {
            i += 1;
            if i >= chars.len() {
                return Err(PathParseError::EmptyKey(i));
            }
        }

        while i < chars.len() {
            if chars[i] == '.' {
                i += 1;
                if i >= chars.len() || chars[i] == '.' || chars[i] == '[' {
                    return Err(PathParseError::EmptyKey(i));
                }
            }

            if chars[i] == '[' {
                let start = i;
                i += 1;
                let idx_start = i;

                while i < chars.len() && chars[i] != ']' {
                    i += 1;
                }

                if i >= chars.len() {
                    return Err(PathParseError::UnclosedBracket(start));
                }

                let idx_str: String = chars[idx_start..i].iter().collect();
                let idx = idx_str
                    .parse::<usize>()
                    .map_err(|_| PathParseError::InvalidIndex(idx_start, idx_str))?;

                segments.push(PathSegment::Index(idx));
                i += 1;
            } else if is_key_char(chars[i]) {
                let key_start = i;
                while i < chars.len() && is_key_char(chars[i]) {
                    i += 1;
                }
                let key: String = chars[key_start..i].iter().collect();
                segments.push(PathSegment::Key(key));
            } else {
                return Err(PathParseError::UnexpectedChar(chars[i], i));
            }
        }

        Ok(FieldPath { segments })
    }
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_path_string())
    }
}
