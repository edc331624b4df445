//! Primitives layer for recordb
//!
//! This crate implements the record store on top of the document-table
//! contract:
//! - RecordStore: add/get/history/search/delete of typed records
//! - TableSchema: the table and indexes the record store needs
//!
//! RecordStore is a stateless facade holding an `Arc<dyn DocumentTable>`,
//! so any engine implementing that trait can back it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod record_store;
pub mod schema;

pub use record_store::{HistoryQuery, RecordStore, SearchQuery, SearchResult};
pub use schema::{AppliedSchema, TableSchema, HISTORY_INDEX, TYPE_INDEX};
