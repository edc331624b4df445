//! recordb - Deterministic-identity record store
//!
//! recordb stores typed records (`type`, subject `sid`, optional object
//! `oid`, timestamp, optional payload) in a single document table. A
//! record's id is derived from `(type, sid, oid)`, so the same logical
//! record always maps to the same row.
//!
//! # Quick Start
//!
//! ```ignore
//! use recordb::{Database, HistoryQuery, RecordSpec, RecordStore, SearchQuery};
//!
//! let db = Database::in_memory();
//! let store = RecordStore::open(&db)?;
//!
//! store.add(&RecordSpec::new("visit", "alice").with_object("page-1")).await?;
//! store.add(&RecordSpec::new("visit", "alice").updating()).await?;
//!
//! let history = store.get_all(&HistoryQuery::new("visit", "alice")).await?;
//! let visits = store.search(&SearchQuery::new().with_type("visit").count()).await?;
//! ```
//!
//! # Architecture
//!
//! - `recordb-core`: records, ids, timestamps, values, errors
//! - `recordb-storage`: the `DocumentTable` contract and the in-memory table
//! - `recordb-engine`: database handle, configuration, snapshots
//! - `recordb-primitives`: `RecordStore` and its table schema

pub use recordb_core::{
    Error, Record, RecordId, RecordSpec, Result, SchemaObject, Timestamp, Value,
};
pub use recordb_engine::{Database, RecordbConfig};
pub use recordb_primitives::{
    AppliedSchema, HistoryQuery, RecordStore, SearchQuery, SearchResult, TableSchema,
};
pub use recordb_storage::{DocumentTable, MemoryTable, WriteSummary};
