//! Storage layer for recordb
//!
//! This crate defines the document-table contract the record store is
//! written against, and an in-memory engine that satisfies it:
//! - DocumentTable: async query surface over one table (the seam)
//! - RangeQuery / ScanQuery / Predicate: query shapes
//! - IndexSpec / SecondaryIndex: ordered secondary indices
//! - MemoryTable: `RwLock`-guarded rows plus indices

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod index;
pub mod memory;
pub mod query;
pub mod traits;

pub use index::{Field, IndexKey, IndexSpec, IndexValue, SecondaryIndex};
pub use memory::MemoryTable;
pub use query::{Order, Predicate, RangeQuery, ScanQuery, Selection, Take};
pub use traits::{DocumentTable, Replacer, WriteSummary};
