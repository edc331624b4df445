//! Record and record-construction types
//!
//! A [`Record`] is an event or fact attached to a subject (`sid`), optionally
//! scoped to an object (`oid`). Records are built from a [`RecordSpec`],
//! which validates the mandatory fields and derives the identifier. Building
//! never touches storage.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::timestamp::Timestamp;
use crate::types::RecordId;
use crate::value::Value;

/// A stored record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Deterministic identifier over `(type, sid, oid)`
    pub id: RecordId,
    /// Category discriminator
    #[serde(rename = "type")]
    pub record_type: String,
    /// Subject id: the entity the record is about
    pub sid: String,
    /// Object id: a secondary entity the record relates to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oid: Option<String>,
    /// Milliseconds since epoch
    pub ts: Timestamp,
    /// Opaque payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Input for building a record
///
/// Every field is optional so that incomplete input reaches validation and
/// is rejected there, the same way for every operation that builds an
/// identity.
///
/// ```
/// use recordb_core::{RecordSpec, Timestamp};
///
/// let record = RecordSpec::new("login", "user-1")
///     .with_object("device-9")
///     .with_timestamp(Timestamp::from_millis(1_000))
///     .build()
///     .unwrap();
/// assert_eq!(record.oid.as_deref(), Some("device-9"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSpec {
    /// Category discriminator (required)
    pub record_type: Option<String>,
    /// Subject id (required)
    pub sid: Option<String>,
    /// Object id
    pub oid: Option<String>,
    /// Timestamp; defaults to now when absent
    pub ts: Option<Timestamp>,
    /// Payload
    pub data: Option<Value>,
    /// Upsert instead of insert when adding
    pub update: bool,
}

impl RecordSpec {
    /// Spec with both mandatory fields set
    pub fn new(record_type: impl Into<String>, sid: impl Into<String>) -> Self {
        Self {
            record_type: Some(record_type.into()),
            sid: Some(sid.into()),
            ..Self::default()
        }
    }

    /// Set the type
    pub fn with_type(mut self, record_type: impl Into<String>) -> Self {
        self.record_type = Some(record_type.into());
        self
    }

    /// Set the subject id
    pub fn with_subject(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    /// Set the object id
    pub fn with_object(mut self, oid: impl Into<String>) -> Self {
        self.oid = Some(oid.into());
        self
    }

    /// Set an explicit timestamp
    pub fn with_timestamp(mut self, ts: impl Into<Timestamp>) -> Self {
        self.ts = Some(ts.into());
        self
    }

    /// Set the payload
    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Request upsert semantics from `add`
    pub fn updating(mut self) -> Self {
        self.update = true;
        self
    }

    /// Identifier this spec addresses, without building the full record
    pub fn id(&self) -> Result<RecordId> {
        let (record_type, sid) = self.required()?;
        Ok(RecordId::derive(record_type, sid, self.object()))
    }

    /// Build the record: validate, derive the id, default the timestamp
    ///
    /// Empty strings count as absent. A `Null` payload is dropped.
    ///
    /// # Errors
    ///
    /// `Error::InvalidInput` when the type or subject id is missing, or the
    /// payload holds a NaN or infinite number.
    pub fn build(&self) -> Result<Record> {
        let (record_type, sid) = self.required()?;
        let oid = self.object();

        if self.data.as_ref().is_some_and(|d| !d.is_finite()) {
            return Err(Error::invalid_input(
                "Record data must not contain NaN or infinite numbers",
            ));
        }

        Ok(Record {
            id: RecordId::derive(record_type, sid, oid),
            record_type: record_type.to_string(),
            sid: sid.to_string(),
            oid: oid.map(str::to_string),
            ts: self.ts.unwrap_or_else(Timestamp::now),
            data: self.data.clone().filter(|d| !d.is_null()),
        })
    }

    fn required(&self) -> Result<(&str, &str)> {
        match (non_empty(&self.record_type), non_empty(&self.sid)) {
            (Some(t), Some(s)) => Ok((t, s)),
            _ => Err(Error::invalid_input(
                "No type or subject id provided for a record",
            )),
        }
    }

    fn object(&self) -> Option<&str> {
        non_empty(&self.oid)
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_full_record() {
        let record = RecordSpec::new("test", "subject")
            .with_object("object")
            .with_timestamp(Timestamp::from_millis(42))
            .with_data(Value::from(json!({"test": "data"})))
            .build()
            .unwrap();

        assert_eq!(record.record_type, "test");
        assert_eq!(record.sid, "subject");
        assert_eq!(record.oid.as_deref(), Some("object"));
        assert_eq!(record.ts, Timestamp::from_millis(42));
        assert_eq!(
            record.data.as_ref().and_then(|d| d.get("test")),
            Some(&Value::from("data"))
        );
        assert_eq!(record.id, RecordId::derive("test", "subject", Some("object")));
    }

    #[test]
    fn test_build_defaults_timestamp_to_now() {
        let before = Timestamp::now();
        let record = RecordSpec::new("test", "subject").build().unwrap();
        assert!(record.ts >= before);
        assert!(record.oid.is_none());
        assert!(record.data.is_none());
    }

    #[test]
    fn test_build_rejects_missing_type_or_subject() {
        let no_type = RecordSpec::default().with_subject("subject");
        let no_sid = RecordSpec::default().with_type("test");
        let empty_sid = RecordSpec::new("test", "");

        for spec in [no_type, no_sid, empty_sid, RecordSpec::default()] {
            assert!(matches!(spec.build(), Err(Error::InvalidInput(_))));
            assert!(matches!(spec.id(), Err(Error::InvalidInput(_))));
        }
    }

    #[test]
    fn test_empty_object_id_is_absent() {
        let record = RecordSpec::new("test", "subject")
            .with_object("")
            .build()
            .unwrap();
        assert!(record.oid.is_none());
        assert_eq!(record.id, RecordId::derive("test", "subject", None));
    }

    #[test]
    fn test_null_data_is_dropped() {
        let record = RecordSpec::new("test", "subject")
            .with_data(Value::Null)
            .build()
            .unwrap();
        assert!(record.data.is_none());
    }

    #[test]
    fn test_non_finite_data_is_rejected() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let spec = RecordSpec::new("test", "subject")
                .with_data(Value::Array(vec![Value::Int(1), Value::Float(bad)]));
            assert!(matches!(spec.build(), Err(Error::InvalidInput(_))));
            // The identity alone does not look at the payload
            assert!(spec.id().is_ok());
        }

        let fine = RecordSpec::new("test", "subject").with_data(1.5);
        assert!(fine.build().is_ok());
    }

    #[test]
    fn test_data_is_stored_as_plain_json() {
        let record = RecordSpec::new("test", "subject")
            .with_timestamp(Timestamp::from_millis(7))
            .with_data(Value::from(json!({"test": "data"})))
            .build()
            .unwrap();
        let doc = serde_json::to_value(&record).unwrap();
        assert_eq!(doc["data"], json!({"test": "data"}));
    }

    #[test]
    fn test_id_ignores_time_and_payload() {
        let a = RecordSpec::new("test", "subject")
            .with_timestamp(Timestamp::from_millis(1))
            .build()
            .unwrap();
        let b = RecordSpec::new("test", "subject")
            .with_timestamp(Timestamp::from_millis(2))
            .with_data("payload")
            .build()
            .unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_record_document_shape() {
        let record = RecordSpec::new("test", "subject")
            .with_timestamp(Timestamp::from_millis(7))
            .build()
            .unwrap();
        let doc = serde_json::to_value(&record).unwrap();
        assert_eq!(doc["type"], json!("test"));
        assert_eq!(doc["sid"], json!("subject"));
        assert_eq!(doc["ts"], json!(7));
        assert!(doc.get("oid").is_none());
        assert!(doc.get("data").is_none());

        let back: Record = serde_json::from_value(doc).unwrap();
        assert_eq!(back, record);
    }
}
