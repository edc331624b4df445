//! Error types for recordb
//!
//! This module defines all error types used throughout the workspace.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Schema setup relies on [`Error::is_already_exists`] to tell an idempotent
//! re-application apart from a real failure, so "already exists" is a
//! structured variant rather than a message to be matched on.

use crate::types::RecordId;
use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias for recordb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Kind of schema object named in an [`Error::AlreadyExists`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaObject {
    /// A document table
    Table,
    /// A secondary index on a table
    Index,
}

impl fmt::Display for SchemaObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaObject::Table => f.write_str("Table"),
            SchemaObject::Index => f.write_str("Index"),
        }
    }
}

/// Error types for recordb
#[derive(Debug, Error)]
pub enum Error {
    /// Caller supplied incomplete or malformed input (e.g. no type or subject id)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A range bound over an ordered index is missing one of its key components
    #[error("Missing range key: bound for index '{index}' has no value at position {position}")]
    MissingRangeKey {
        /// Index the bound was built for
        index: String,
        /// Zero-based position of the missing component
        position: usize,
    },

    /// Insert of a record whose identifier is already stored
    #[error("Duplicate primary key: {0}")]
    DuplicateId(RecordId),

    /// Table or index creation hit an existing object
    #[error("{kind} '{name}' already exists")]
    AlreadyExists {
        /// Which kind of object clashed
        kind: SchemaObject,
        /// Fully qualified name (`table` or `table.index`)
        name: String,
    },

    /// Table is not part of the database
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Index is not defined on the table
    #[error("Index '{index}' not found on table '{table}'")]
    IndexNotFound {
        /// Table the lookup ran against
        table: String,
        /// Requested index name
        index: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// I/O error (snapshot and config files)
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Configuration could not be read or is invalid
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    /// Build an `InvalidInput` error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Build an `AlreadyExists` error for a table
    pub fn table_exists(name: impl Into<String>) -> Self {
        Error::AlreadyExists {
            kind: SchemaObject::Table,
            name: name.into(),
        }
    }

    /// Build an `AlreadyExists` error for an index, qualified as `table.index`
    pub fn index_exists(table: &str, index: &str) -> Self {
        Error::AlreadyExists {
            kind: SchemaObject::Index,
            name: format!("{}.{}", table, index),
        }
    }

    /// Whether this error reports that a schema object already exists
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::AlreadyExists { .. })
    }

    /// Whether this error is a caller contract violation rather than a storage failure
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_) | Error::MissingRangeKey { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::SerializationError(e.to_string())
    }
}
