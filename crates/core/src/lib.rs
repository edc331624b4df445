//! Core types for recordb
//!
//! This crate defines the foundational types used throughout the workspace:
//! - Record: an event or fact about a subject, optionally scoped to an object
//! - RecordSpec: validated construction of records
//! - RecordId: deterministic, name-based identifier
//! - Timestamp: milliseconds since epoch
//! - Value: opaque structured payload
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod record;
pub mod timestamp;
pub mod types;
pub mod value;

pub use error::{Error, Result, SchemaObject};
pub use record::{Record, RecordSpec};
pub use timestamp::Timestamp;
pub use types::{identity_name, RecordId, RECORD_NAMESPACE};
pub use value::Value;
