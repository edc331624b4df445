//! Records table schema
//!
//! The record store expects one table with two secondary indexes:
//! - `type`: single field, for search across all subjects of a type
//! - `index`: `(type, sid, ts)`, for per-subject history in time order
//!
//! Applying a schema is idempotent. Objects that already exist are skipped
//! and left out of the returned [`AppliedSchema`]; any other failure aborts
//! the application and propagates.

use recordb_core::Result;
use recordb_engine::Database;
use recordb_storage::{Field, IndexSpec};
use tracing::info;

/// Name of the single-field index over `type`
pub const TYPE_INDEX: &str = "type";

/// Name of the compound index over `(type, sid, ts)`
pub const HISTORY_INDEX: &str = "index";

/// A table and the indexes it needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Table name
    pub table: String,
    /// Index definitions
    pub indexes: Vec<IndexSpec>,
}

/// What a schema application actually created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedSchema {
    /// Tables created
    pub tables: Vec<String>,
    /// Indexes created, as `table.index`
    pub indexes: Vec<String>,
}

impl AppliedSchema {
    /// Whether nothing had to be created
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.indexes.is_empty()
    }
}

impl TableSchema {
    /// Schema of a records table
    pub fn records(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            indexes: vec![
                IndexSpec::single(Field::Type),
                IndexSpec::compound(
                    HISTORY_INDEX,
                    vec![Field::Type, Field::Subject, Field::Timestamp],
                ),
            ],
        }
    }

    /// Create the table and its indexes, skipping those that exist
    pub fn apply(&self, db: &Database) -> Result<AppliedSchema> {
        let mut applied = AppliedSchema::default();

        if created(db.table_create(&self.table))? {
            applied.tables.push(self.table.clone());
        }
        for spec in &self.indexes {
            if created(db.index_create(&self.table, spec.clone()))? {
                applied.indexes.push(format!("{}.{}", self.table, spec.name));
            }
        }

        if !applied.is_empty() {
            info!(
                tables = ?applied.tables,
                indexes = ?applied.indexes,
                "Schema applied"
            );
        }
        Ok(applied)
    }

    /// Drop the table; returns whether it existed
    pub fn drop_table(&self, db: &Database) -> Result<bool> {
        match db.table_drop(&self.table) {
            Ok(()) => Ok(true),
            Err(recordb_core::Error::TableNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// `Ok(true)` if created, `Ok(false)` if it already existed
fn created(result: Result<()>) -> Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.is_already_exists() => Ok(false),
        Err(e) => Err(e),
    }
}
