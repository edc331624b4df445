//! Database engine for recordb
//!
//! This crate owns the pieces around the tables:
//! - Database: table registry, schema operations, open/checkpoint
//! - RecordbConfig: `recordb.toml` configuration
//! - TableSnapshot: JSON table snapshots for on-disk databases

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod database;
pub mod snapshot;

pub use config::{RecordbConfig, CONFIG_FILE_NAME, DEFAULT_TABLE};
pub use database::Database;
pub use snapshot::TableSnapshot;
