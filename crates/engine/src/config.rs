//! Database configuration via `recordb.toml`
//!
//! On first open of a data directory a default `recordb.toml` is written.
//! To change settings, edit the file and reopen the database.

use recordb_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file name placed in the database data directory.
pub const CONFIG_FILE_NAME: &str = "recordb.toml";

/// Default name of the records table.
pub const DEFAULT_TABLE: &str = "records";

/// Database configuration loaded from `recordb.toml`.
///
/// # Example
///
/// ```toml
/// table = "records"
/// apply_schema_on_open = true
/// snapshot_on_close = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordbConfig {
    /// Name of the table records are stored in.
    #[serde(default = "default_table")]
    pub table: String,
    /// Create the records table and its indexes when a store is opened.
    #[serde(default = "default_true")]
    pub apply_schema_on_open: bool,
    /// Write table snapshots when the database is dropped (on-disk only).
    #[serde(default = "default_true")]
    pub snapshot_on_close: bool,
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for RecordbConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            apply_schema_on_open: true,
            snapshot_on_close: true,
        }
    }
}

impl RecordbConfig {
    /// Check that the configured values are usable.
    ///
    /// Table names are limited to ASCII letters, digits and `_` because they
    /// double as snapshot file names.
    pub fn validate(&self) -> Result<()> {
        validate_table_name(&self.table)
            .map_err(|msg| Error::ConfigError(format!("Invalid table name: {}", msg)))
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# recordb configuration
#
# Table records are stored in (letters, digits and '_' only)
table = "records"

# Create the records table and its indexes when a store is opened.
# Re-applying an existing schema is a no-op.
apply_schema_on_open = true

# Write table snapshots to <data_dir>/tables when the database is dropped.
snapshot_on_close = true
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: RecordbConfig = toml::from_str(&content).map_err(|e| {
            Error::ConfigError(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
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
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Check a table name, returning the reason it is rejected.
pub fn validate_table_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("name is empty".to_string());
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
    {
        return Err(format!("'{}' contains unsupported character '{}'", name, c));
    }
    Ok(())
}
