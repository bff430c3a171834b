//! Database configuration via `folio.toml`
//!
//! A small TOML file holding the tunables of the document layer. Missing
//! keys fall back to defaults, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use folio_core::{Error, Result};

use crate::retry::RetryPolicy;

/// Conventional config file name
pub const CONFIG_FILE_NAME: &str = "folio.toml";

/// Database configuration loaded from `folio.toml`.
///
/// # Example
///
/// ```toml
/// [retry]
/// max_attempts = 64
/// base_delay_ms = 1
/// max_delay_ms = 20
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    /// Retry policy of every compare-and-swap loop
    pub retry: RetryPolicy,
}

impl FolioConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# folio configuration
#
# Compare-and-swap retry policy, used by document writes, read-modify-write
# updates and index bucket maintenance.
[retry]
# Attempts per operation before giving up. Omit to retry forever (default).
# max_attempts = 64

# Exponential backoff between attempts, in milliseconds. 0 = retry at once.
base_delay_ms = 0
max_delay_ms = 0
"#
    }

    /// Parse config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Read and parse config from a file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
