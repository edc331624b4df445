//! Identity types for recordb
//!
//! A record is addressed by a [`RecordId`]: a name-based (version 5) UUID
//! computed over the record's logical key. The id depends only on
//! `(type, sid, oid)`; time and payload never enter it, so re-building a
//! record from the same triple always addresses the same row.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Namespace UUID all record identifiers are derived under.
///
/// Changing this value re-keys every stored record.
pub const RECORD_NAMESPACE: Uuid = Uuid::NAMESPACE_URL;

/// Separator between the components of a record's identity name
pub const IDENTITY_SEPARATOR: char = '.';

/// Deterministic record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Derive the identifier for a `(type, sid, oid)` triple
    pub fn derive(record_type: &str, sid: &str, oid: Option<&str>) -> Self {
        let name = identity_name(record_type, sid, oid);
        RecordId(Uuid::new_v5(&RECORD_NAMESPACE, name.as_bytes()))
    }

    /// Wrap an existing UUID
    pub const fn from_uuid(uuid: Uuid) -> Self {
        RecordId(uuid)
    }

    /// The underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(RecordId)
            .map_err(|e| Error::invalid_input(format!("Invalid record id '{}': {}", s, e)))
    }
}

impl From<Uuid> for RecordId {
    fn from(uuid: Uuid) -> Self {
        RecordId(uuid)
    }
}

/// Build the name a record identifier is hashed from: `type.sid` or `type.sid.oid`
pub fn identity_name(record_type: &str, sid: &str, oid: Option<&str>) -> String {
    let mut name = String::with_capacity(
        record_type.len() + sid.len() + oid.map_or(0, |o| o.len() + 1) + 1,
    );
    name.push_str(record_type);
    name.push(IDENTITY_SEPARATOR);
    name.push_str(sid);
    if let Some(oid) = oid {
        name.push(IDENTITY_SEPARATOR);
        name.push_str(oid);
    }
    name
}
