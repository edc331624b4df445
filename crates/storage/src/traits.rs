//! Document table abstraction
//!
//! [`DocumentTable`] is the seam between the record store and whatever
//! engine holds the rows. It is a small query-builder surface over a single
//! table: point reads and writes keyed by [`RecordId`], a conditional
//! replace, ranges over ordered indexes, index-equality and full-table scans,
//! counts and bulk deletes.
//!
//! Thread safety: implementations are shared behind `Arc<dyn DocumentTable>`
//! and must be `Send + Sync`. Each single-row write is atomic; nothing
//! spans rows.

use async_trait::async_trait;
use recordb_core::{Record, RecordId, Result};

use crate::query::{Predicate, RangeQuery, ScanQuery};

/// Computes the replacement for a row from its current state
///
/// Receives the stored row (or `None` when absent) and returns the row to
/// store, or `None` to leave the table without it.
pub type Replacer = Box<dyn FnOnce(Option<&Record>) -> Option<Record> + Send>;

/// Counts of what a write changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Rows created
    pub inserted: u64,
    /// Rows overwritten with a different value
    pub replaced: u64,
    /// Rows the write left as they were
    pub unchanged: u64,
    /// Rows removed
    pub deleted: u64,
}

impl WriteSummary {
    /// Summary of a single insert
    pub fn inserted() -> Self {
        Self {
            inserted: 1,
            ..Self::default()
        }
    }

    /// Summary of `n` deletes
    pub fn deleted(n: u64) -> Self {
        Self {
            deleted: n,
            ..Self::default()
        }
    }
}

/// Async query surface over one document table
#[async_trait]
pub trait DocumentTable: Send + Sync {
    /// Table name
    fn name(&self) -> &str;

    /// Get a row by id; `None` when absent
    async fn get(&self, id: &RecordId) -> Result<Option<Record>>;

    /// Insert a new row
    ///
    /// # Errors
    ///
    /// `Error::DuplicateId` when a row with the same id exists.
    async fn insert(&self, record: Record) -> Result<WriteSummary>;

    /// Atomically replace the row at `id` with `replacer`'s output
    ///
    /// # Errors
    ///
    /// `Error::InvalidInput` when the replacement carries a different id.
    async fn replace(&self, id: &RecordId, replacer: Replacer) -> Result<WriteSummary>;

    /// Delete the row at `id`; deleting an absent row is not an error
    async fn delete(&self, id: &RecordId) -> Result<WriteSummary>;

    /// Rows in an index range, ordered by index key
    ///
    /// # Errors
    ///
    /// `Error::IndexNotFound` when the index is not defined.
    async fn between(&self, query: &RangeQuery) -> Result<Vec<Record>>;

    /// Rows of a selection after filter and take
    ///
    /// # Errors
    ///
    /// `Error::IndexNotFound` when the selection names an undefined index.
    async fn select(&self, query: &ScanQuery) -> Result<Vec<Record>>;

    /// Number of rows of a selection after filter
    async fn count(&self, query: &ScanQuery) -> Result<u64>;

    /// Delete every row matching `filter`
    async fn delete_where(&self, filter: &Predicate) -> Result<WriteSummary>;

    /// Names of the indexes defined on this table
    async fn index_list(&self) -> Result<Vec<String>>;
}
