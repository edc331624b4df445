//! RecordStore: typed records over a document table
//!
//! ## Design
//!
//! RecordStore is a stateless facade over a [`DocumentTable`]. It holds no
//! in-memory state beyond an `Arc<dyn DocumentTable>` reference; every call
//! maps to one or two table operations.
//!
//! ## Identity
//!
//! A record's id is derived from `(type, sid, oid)` (see [`RecordId`]), so
//! the same logical record always lands on the same row. Adding it twice
//! fails unless the second add asks for an update.
//!
//! ## Update mode
//!
//! `add` with `update` set is a conditional replace: if the row exists only
//! its `ts` is refreshed, otherwise the freshly built record is inserted.
//! Any `data` passed along with an update of an existing row is dropped.
//!
//! ## Thread Safety
//!
//! RecordStore is `Send + Sync` and cheap to clone. Concurrent update-mode
//! adds of the same record are last-writer-wins.

use std::sync::Arc;

use recordb_core::{Record, RecordId, RecordSpec, Result};
use recordb_engine::Database;
use recordb_storage::{
    DocumentTable, Field, IndexKey, IndexValue, Order, Predicate, RangeQuery, ScanQuery,
    Selection, Take,
};
use tracing::debug;

use crate::schema::{TableSchema, HISTORY_INDEX, TYPE_INDEX};

// ========== Queries ==========

/// History of one subject, newest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Record type (required)
    pub record_type: Option<String>,
    /// Subject id (required)
    pub sid: Option<String>,
    /// Only records about this object
    pub oid: Option<String>,
    /// Maximum number of records; zero means no limit
    pub limit: Option<usize>,
}

impl HistoryQuery {
    /// History of `sid` for records of `record_type`
    pub fn new(record_type: impl Into<String>, sid: impl Into<String>) -> Self {
        Self {
            record_type: Some(record_type.into()),
            sid: Some(sid.into()),
            ..Self::default()
        }
    }

    /// Restrict to records about `oid`
    pub fn with_object(mut self, oid: impl Into<String>) -> Self {
        self.oid = Some(oid.into());
        self
    }

    /// Return at most `limit` records
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Filtered search across the table
///
/// At most one of `sample`, `limit` and `count` takes effect, in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Only records of this type (served by the `type` index)
    pub record_type: Option<String>,
    /// Only records about this subject
    pub sid: Option<String>,
    /// Only records about this object
    pub oid: Option<String>,
    /// Random sample of this many records
    pub sample: Option<usize>,
    /// First this many records
    pub limit: Option<usize>,
    /// Return the number of matches instead of the records
    pub count: bool,
}

impl SearchQuery {
    /// Search everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to `record_type`
    pub fn with_type(mut self, record_type: impl Into<String>) -> Self {
        self.record_type = Some(record_type.into());
        self
    }

    /// Restrict to `sid`
    pub fn with_subject(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    /// Restrict to `oid`
    pub fn with_object(mut self, oid: impl Into<String>) -> Self {
        self.oid = Some(oid.into());
        self
    }

    /// Random sample of `n` matches
    pub fn sample(mut self, n: usize) -> Self {
        self.sample = Some(n);
        self
    }

    /// First `n` matches
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Count matches instead of returning them
    pub fn count(mut self) -> Self {
        self.count = true;
        self
    }

    /// Post-filter over sid/oid; empty strings do not filter
    fn filter(&self) -> Option<Predicate> {
        let mut preds = Vec::new();
        if let Some(sid) = present(&self.sid) {
            preds.push(Predicate::eq(Field::Subject, sid));
        }
        if let Some(oid) = present(&self.oid) {
            preds.push(Predicate::eq(Field::Object, oid));
        }
        Predicate::all(preds)
    }
}

/// Outcome of [`RecordStore::search`]
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResult {
    /// Matching records
    Records(Vec<Record>),
    /// Number of matching records
    Count(u64),
}

impl SearchResult {
    /// The records, if this is not a count
    pub fn records(self) -> Option<Vec<Record>> {
        match self {
            SearchResult::Records(records) => Some(records),
            SearchResult::Count(_) => None,
        }
    }

    /// Number of matches either way
    pub fn len(&self) -> u64 {
        match self {
            SearchResult::Records(records) => records.len() as u64,
            SearchResult::Count(n) => *n,
        }
    }

    /// Whether nothing matched
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn positive(n: Option<usize>) -> Option<usize> {
    n.filter(|n| *n > 0)
}

// ========== RecordStore ==========

/// Record store primitive
///
/// # Example
///
/// ```ignore
/// use recordb_engine::Database;
/// use recordb_primitives::{RecordStore, SearchQuery};
/// use recordb_core::RecordSpec;
///
/// let db = Database::open("/path/to/data")?;
/// let store = RecordStore::open(&db)?;
///
/// store.add(&RecordSpec::new("visit", "alice").with_object("page-1")).await?;
/// let history = store.get_all(&HistoryQuery::new("visit", "alice")).await?;
/// let n = store.search(&SearchQuery::new().with_type("visit").count()).await?;
/// ```
#[derive(Clone)]
pub struct RecordStore {
    db: Option<Arc<Database>>,
    table: Arc<dyn DocumentTable>,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("table", &self.table.name())
            .finish()
    }
}

impl RecordStore {
    /// Create a store over an existing table
    ///
    /// The table is expected to carry the `type` and `index` indexes of
    /// [`TableSchema::records`].
    pub fn new(table: Arc<dyn DocumentTable>) -> Self {
        Self { db: None, table }
    }

    /// Create a store over the configured table of `db`
    ///
    /// Applies the records schema first when `apply_schema_on_open` is set.
    /// The store keeps `db` alive, so its close-time checkpoint runs only
    /// after the last store clone is gone.
    pub fn open(db: &Arc<Database>) -> Result<Self> {
        let config = db.config();
        if config.apply_schema_on_open {
            TableSchema::records(config.table.clone()).apply(db)?;
        }
        Ok(Self {
            db: Some(Arc::clone(db)),
            table: db.document_table(&config.table)?,
        })
    }

    /// Get the database this store was opened on, if any
    pub fn database(&self) -> Option<&Arc<Database>> {
        self.db.as_ref()
    }

    /// Get the underlying table
    pub fn table(&self) -> &Arc<dyn DocumentTable> {
        &self.table
    }

    // ========== Reads ==========

    /// Build a record without touching storage
    ///
    /// # Errors
    ///
    /// `InvalidInput` if type or sid is missing.
    pub fn record(&self, spec: &RecordSpec) -> Result<Record> {
        spec.build()
    }

    /// Get a record by id
    pub async fn get(&self, id: &RecordId) -> Result<Option<Record>> {
        self.table.get(id).await
    }

    /// Get a record by its `(type, sid, oid)`
    pub async fn get_record(&self, spec: &RecordSpec) -> Result<Option<Record>> {
        let id = spec.id()?;
        self.table.get(&id).await
    }

    /// Records of one subject, newest first
    ///
    /// # Errors
    ///
    /// `MissingRangeKey` if type or sid is not given or empty.
    pub async fn get_all(&self, query: &HistoryQuery) -> Result<Vec<Record>> {
        let bound = |edge: IndexValue| {
            IndexKey::bound(
                HISTORY_INDEX,
                [
                    present(&query.record_type).map(IndexValue::from),
                    present(&query.sid).map(IndexValue::from),
                    Some(edge),
                ],
            )
        };
        let lower = bound(IndexValue::Min)?;
        let upper = bound(IndexValue::Max)?;

        let filter = present(&query.oid).map(|oid| Predicate::eq(Field::Object, oid));
        let range = RangeQuery::new(HISTORY_INDEX, lower, upper)
            .order(Order::Descending)
            .filter(filter)
            .limit(positive(query.limit));

        self.table.between(&range).await
    }

    /// Whether a record with this `(type, sid, oid)` exists
    pub async fn has(&self, spec: &RecordSpec) -> Result<bool> {
        Ok(self.get_record(spec).await?.is_some())
    }

    /// Search by type, subject and object
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResult> {
        let selection = match &query.record_type {
            Some(t) => Selection::index(TYPE_INDEX, IndexKey::single(t.as_str())),
            None => Selection::Table,
        };
        let scan = ScanQuery::new(selection).filter(query.filter());

        if let Some(n) = positive(query.sample) {
            let records = self.table.select(&scan.take(Take::Sample(n))).await?;
            return Ok(SearchResult::Records(records));
        }
        if let Some(n) = positive(query.limit) {
            let records = self.table.select(&scan.take(Take::Limit(n))).await?;
            return Ok(SearchResult::Records(records));
        }
        if query.count {
            return Ok(SearchResult::Count(self.table.count(&scan).await?));
        }
        Ok(SearchResult::Records(self.table.select(&scan).await?))
    }

    // ========== Writes ==========

    /// Add a record, returning its id
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if type or sid is missing
    /// - `DuplicateId` if the record exists and `update` is not set
    pub async fn add(&self, spec: &RecordSpec) -> Result<RecordId> {
        let record = spec.build()?;
        let id = record.id;

        if spec.update {
            let ts = record.ts;
            let summary = self
                .table
                .replace(
                    &id,
                    Box::new(move |current: Option<&Record>| match current {
                        Some(row) => Some(Record {
                            ts,
                            ..row.clone()
                        }),
                        None => Some(record),
                    }),
                )
                .await?;
            debug!(table = self.table.name(), %id, ?summary, "Record upserted");
        } else {
            self.table.insert(record).await?;
            debug!(table = self.table.name(), %id, "Record added");
        }
        Ok(id)
    }

    /// Delete one record, returning its id
    ///
    /// Deleting a record that does not exist is not an error.
    pub async fn delete(&self, spec: &RecordSpec) -> Result<RecordId> {
        let id = spec.id()?;
        let summary = self.table.delete(&id).await?;
        debug!(table = self.table.name(), %id, deleted = summary.deleted, "Record deleted");
        Ok(id)
    }

    /// Delete every record whose sid or oid is `id`, returning the count
    pub async fn delete_all(&self, id: &str) -> Result<u64> {
        let filter = Predicate::Or(vec![
            Predicate::eq(Field::Subject, id),
            Predicate::eq(Field::Object, id),
        ]);
        let summary = self.table.delete_where(&filter).await?;
        debug!(table = self.table.name(), id, deleted = summary.deleted, "Records deleted");
        Ok(summary.deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordb_core::{Error, Timestamp};

    fn store() -> RecordStore {
        let db = Database::in_memory();
        RecordStore::open(&db).unwrap()
    }

    #[test]
    fn test_search_filter_skips_empty() {
        assert_eq!(SearchQuery::new().filter(), None);
        assert_eq!(SearchQuery::new().with_subject("").filter(), None);
        assert_eq!(
            SearchQuery::new().with_object("o").filter(),
            Some(Predicate::eq(Field::Object, "o"))
        );
        assert!(matches!(
            SearchQuery::new().with_subject("s").with_object("o").filter(),
            Some(Predicate::And(_))
        ));
    }

    #[test]
    fn test_search_result_len() {
        assert_eq!(SearchResult::Count(3).len(), 3);
        assert!(SearchResult::Records(vec![]).is_empty());
        assert_eq!(SearchResult::Count(3).records(), None);
    }

    #[test]
    fn test_open_without_schema_requires_table() {
        let config = recordb_engine::RecordbConfig {
            apply_schema_on_open: false,
            ..Default::default()
        };
        let db = Database::in_memory_with_config(config).unwrap();
        assert!(matches!(
            RecordStore::open(&db),
            Err(Error::TableNotFound(_))
        ));

        TableSchema::records("records").apply(&db).unwrap();
        assert!(RecordStore::open(&db).is_ok());
    }

    #[test]
    fn test_record_is_pure() {
        let store = store();
        let record = store
            .record(&RecordSpec::new("t", "s").with_timestamp(5))
            .unwrap();
        assert_eq!(record.ts, Timestamp::from_millis(5));
        assert!(store.record(&RecordSpec::default()).is_err());
    }

    #[tokio::test]
    async fn test_update_of_absent_record_inserts() {
        let store = store();
        let spec = RecordSpec::new("t", "s").with_data("payload").updating();
        let id = store.add(&spec).await.unwrap();
        let row = store.get(&id).await.unwrap().unwrap();
        assert_eq!(row.data, Some("payload".into()));
    }

    #[tokio::test]
    async fn test_get_all_zero_limit_is_unlimited() {
        let store = store();
        for ts in 1..=3 {
            store
                .add(&RecordSpec::new("t", "s").with_timestamp(ts).updating())
                .await
                .unwrap();
            store
                .add(&RecordSpec::new("t", "s").with_object(format!("o{ts}")))
                .await
                .unwrap();
        }
        let all = store
            .get_all(&HistoryQuery::new("t", "s").with_limit(0))
            .await
            .unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn test_get_all_empty_subject_is_missing() {
        let store = store();
        store.add(&RecordSpec::new("t", "s")).await.unwrap();
        let query = HistoryQuery::new("t", "");
        let err = store.get_all(&query).await.unwrap_err();
        assert!(matches!(err, Error::MissingRangeKey { position: 1, .. }));

        let query = HistoryQuery::new("", "s");
        let err = store.get_all(&query).await.unwrap_err();
        assert!(matches!(err, Error::MissingRangeKey { position: 0, .. }));
    }

    #[test]
    fn test_open_holds_database() {
        let db = Database::in_memory();
        let store = RecordStore::open(&db).unwrap();
        assert_eq!(Arc::strong_count(&db), 2);
        assert!(store.database().is_some());

        let bare = RecordStore::new(db.document_table("records").unwrap());
        assert!(bare.database().is_none());
    }

    #[tokio::test]
    async fn test_get_all_requires_type() {
        let store = store();
        let query = HistoryQuery {
            sid: Some("s".into()),
            ..HistoryQuery::default()
        };
        let err = store.get_all(&query).await.unwrap_err();
        assert!(matches!(err, Error::MissingRangeKey { position: 0, .. }));
    }

    #[tokio::test]
    async fn test_delete_absent_is_ok() {
        let store = store();
        let spec = RecordSpec::new("t", "nobody");
        let id = store.delete(&spec).await.unwrap();
        assert_eq!(id, spec.id().unwrap());
    }

    #[tokio::test]
    async fn test_search_zero_sample_falls_through() {
        let store = store();
        store.add(&RecordSpec::new("t", "a")).await.unwrap();
        store.add(&RecordSpec::new("t", "b")).await.unwrap();

        let query = SearchQuery {
            sample: Some(0),
            limit: Some(1),
            ..SearchQuery::new().with_type("t")
        };
        assert_eq!(store.search(&query).await.unwrap().len(), 1);

        let query = SearchQuery {
            limit: Some(0),
            ..SearchQuery::new().with_type("t").count()
        };
        assert_eq!(store.search(&query).await.unwrap(), SearchResult::Count(2));
    }
}
