//! Table and index names
//!
//! Names must be 1-125 bytes. Index names are reported for diagnostics as
//! `<table>/<index>`, stored on the index when it is built.

use crate::error::{Error, Result};

/// Maximum length of a table or index name, in bytes
pub const MAX_NAME_LENGTH: usize = 125;

/// Validate a table or index name
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_NAME_LENGTH {
        return Err(Error::BadIdentifier(name.to_string()));
    }
    Ok(())
}

/// Diagnostic name of an index: `<table>/<index>`
pub fn qualified_index_name(table: &str, index: &str) -> String {
    format!("{}/{}", table, index)
}
