//! Secondary indices over record fields
//!
//! An index maps an [`IndexKey`] (one value per indexed field, in order) to
//! the set of record ids carrying that key. Keys are kept in a `BTreeMap`,
//! so range scans and ordered iteration come for free:
//! - `type` (single field): equality lookups for all records of a type
//! - `index` over `(type, sid, ts)`: per-subject history in time order
//!
//! Records missing an indexed field (e.g. no `oid`) are left out of that
//! index, the same way a document store skips rows without the field.

use recordb_core::{Error, Record, RecordId, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

/// A record field that can be indexed or filtered on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    /// `type`
    Type,
    /// `sid`
    Subject,
    /// `oid`
    Object,
    /// `ts`
    Timestamp,
}

impl Field {
    /// Field name as stored in documents
    pub fn name(&self) -> &'static str {
        match self {
            Field::Type => "type",
            Field::Subject => "sid",
            Field::Object => "oid",
            Field::Timestamp => "ts",
        }
    }
}

/// A single component of an index key
///
/// `Min` sorts before and `Max` after every other value, which lets a range
/// leave trailing components open.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IndexValue {
    /// Lower sentinel
    Min,
    /// Integer component (timestamps)
    Int(i64),
    /// String component
    Str(String),
    /// Upper sentinel
    Max,
}

impl IndexValue {
    /// Value of `field` in `record`, if the record has it
    pub fn of(record: &Record, field: Field) -> Option<IndexValue> {
        match field {
            Field::Type => Some(IndexValue::Str(record.record_type.clone())),
            Field::Subject => Some(IndexValue::Str(record.sid.clone())),
            Field::Object => record.oid.clone().map(IndexValue::Str),
            Field::Timestamp => Some(IndexValue::Int(record.ts.as_millis())),
        }
    }

    /// Whether `record` carries exactly this value in `field`
    pub fn matches(&self, record: &Record, field: Field) -> bool {
        match (field, self) {
            (Field::Type, IndexValue::Str(s)) => record.record_type == *s,
            (Field::Subject, IndexValue::Str(s)) => record.sid == *s,
            (Field::Object, IndexValue::Str(s)) => record.oid.as_deref() == Some(s.as_str()),
            (Field::Timestamp, IndexValue::Int(i)) => record.ts.as_millis() == *i,
            _ => false,
        }
    }
}

impl From<&str> for IndexValue {
    fn from(s: &str) -> Self {
        IndexValue::Str(s.to_string())
    }
}

impl From<String> for IndexValue {
    fn from(s: String) -> Self {
        IndexValue::Str(s)
    }
}

impl From<i64> for IndexValue {
    fn from(i: i64) -> Self {
        IndexValue::Int(i)
    }
}

/// Ordered tuple of index values
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IndexKey(Vec<IndexValue>);

impl IndexKey {
    /// Key from fully specified components
    pub fn new(parts: Vec<IndexValue>) -> Self {
        IndexKey(parts)
    }

    /// Key for a single-field index
    pub fn single(value: impl Into<IndexValue>) -> Self {
        IndexKey(vec![value.into()])
    }

    /// Build a range bound for `index` from components that may be absent
    ///
    /// # Errors
    ///
    /// `Error::MissingRangeKey` naming the first absent component. A bound
    /// with a hole in it has no position in the index order.
    pub fn bound<I>(index: &str, parts: I) -> Result<Self>
    where
        I: IntoIterator<Item = Option<IndexValue>>,
    {
        parts
            .into_iter()
            .enumerate()
            .map(|(position, part)| {
                part.ok_or_else(|| Error::MissingRangeKey {
                    index: index.to_string(),
                    position,
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(IndexKey)
    }

    /// Components of this key
    pub fn parts(&self) -> &[IndexValue] {
        &self.0
    }
}

/// Definition of a secondary index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Index name, unique per table
    pub name: String,
    /// Indexed fields, in key order
    pub fields: Vec<Field>,
}

impl IndexSpec {
    /// Single-field index named after its field
    pub fn single(field: Field) -> Self {
        Self {
            name: field.name().to_string(),
            fields: vec![field],
        }
    }

    /// Compound index over several fields
    pub fn compound(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Index key for a record, or `None` when the record lacks a field
    pub fn key_for(&self, record: &Record) -> Option<IndexKey> {
        self.fields
            .iter()
            .map(|f| IndexValue::of(record, *f))
            .collect::<Option<Vec<_>>>()
            .map(IndexKey)
    }
}

/// Secondary index: IndexKey → record ids
#[derive(Debug, Clone)]
pub struct SecondaryIndex {
    spec: IndexSpec,
    entries: BTreeMap<IndexKey, BTreeSet<RecordId>>,
}

impl SecondaryIndex {
    /// Create an empty index
    pub fn new(spec: IndexSpec) -> Self {
        Self {
            spec,
            entries: BTreeMap::new(),
        }
    }

    /// Index definition
    pub fn spec(&self) -> &IndexSpec {
        &self.spec
    }

    /// Add a record to the index
    pub fn insert(&mut self, record: &Record) {
        if let Some(key) = self.spec.key_for(record) {
            self.entries.entry(key).or_default().insert(record.id);
        }
    }

    /// Remove a record from the index
    ///
    /// Empty id sets are dropped so the key space does not accumulate holes.
    pub fn remove(&mut self, record: &Record) {
        if let Some(key) = self.spec.key_for(record) {
            if let Some(ids) = self.entries.get_mut(&key) {
                ids.remove(&record.id);
                if ids.is_empty() {
                    self.entries.remove(&key);
                }
            }
        }
    }

    /// Ids whose key equals `key`
    pub fn get(&self, key: &IndexKey) -> impl Iterator<Item = &RecordId> + '_ {
        self.entries.get(key).into_iter().flatten()
    }

    /// Ids with `lower <= key < upper`, in ascending key order
    pub fn range<'a>(
        &'a self,
        lower: &IndexKey,
        upper: &IndexKey,
    ) -> Box<dyn DoubleEndedIterator<Item = &'a RecordId> + 'a> {
        if lower >= upper {
            return Box::new(std::iter::empty());
        }
        Box::new(
            self.entries
                .range((Bound::Included(lower.clone()), Bound::Excluded(upper.clone())))
                .flat_map(|(_, ids)| ids.iter()),
        )
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordb_core::{RecordSpec, Timestamp};

    fn record(t: &str, sid: &str, oid: Option<&str>, ts: i64) -> Record {
        let mut spec = RecordSpec::new(t, sid).with_timestamp(Timestamp::from_millis(ts));
        if let Some(oid) = oid {
            spec = spec.with_object(oid);
        }
        spec.build().unwrap()
    }

    fn history_index() -> SecondaryIndex {
        SecondaryIndex::new(IndexSpec::compound(
            "index",
            vec![Field::Type, Field::Subject, Field::Timestamp],
        ))
    }

    #[test]
    fn test_sentinels_bracket_all_values() {
        assert!(IndexValue::Min < IndexValue::Int(i64::MIN));
        assert!(IndexValue::Min < IndexValue::Str(String::new()));
        assert!(IndexValue::Str("zzz".into()) < IndexValue::Max);
        assert!(IndexValue::Int(i64::MAX) < IndexValue::Max);
    }

    #[test]
    fn test_single_index_named_after_field() {
        let spec = IndexSpec::single(Field::Type);
        assert_eq!(spec.name, "type");
        assert_eq!(spec.fields, vec![Field::Type]);
    }

    #[test]
    fn test_key_for_skips_records_missing_field() {
        let spec = IndexSpec::single(Field::Object);
        assert!(spec.key_for(&record("t", "s", None, 1)).is_none());
        assert_eq!(
            spec.key_for(&record("t", "s", Some("o"), 1)),
            Some(IndexKey::single("o"))
        );
    }

    #[test]
    fn test_bound_reports_first_missing_component() {
        let err = IndexKey::bound(
            "index",
            vec![Some(IndexValue::from("test")), None, Some(IndexValue::Min)],
        )
        .unwrap_err();
        match err {
            Error::MissingRangeKey { index, position } => {
                assert_eq!(index, "index");
                assert_eq!(position, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_range_over_subject_history() {
        let mut index = history_index();
        let old = record("test", "subject", None, 10);
        let new = record("test", "subject", Some("o"), 20);
        let other = record("test", "other", None, 15);
        for r in [&old, &new, &other] {
            index.insert(r);
        }

        let lower = IndexKey::new(vec!["test".into(), "subject".into(), IndexValue::Min]);
        let upper = IndexKey::new(vec!["test".into(), "subject".into(), IndexValue::Max]);

        let ascending: Vec<_> = index.range(&lower, &upper).copied().collect();
        assert_eq!(ascending, vec![old.id, new.id]);

        let descending: Vec<_> = index.range(&lower, &upper).rev().copied().collect();
        assert_eq!(descending, vec![new.id, old.id]);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let mut index = history_index();
        index.insert(&record("test", "subject", None, 10));
        let lower = IndexKey::new(vec!["test".into(), IndexValue::Max]);
        let upper = IndexKey::new(vec!["test".into(), IndexValue::Min]);
        assert_eq!(index.range(&lower, &upper).count(), 0);
    }

    #[test]
    fn test_remove_drops_empty_keys() {
        let mut index = SecondaryIndex::new(IndexSpec::single(Field::Type));
        let a = record("test", "a", None, 1);
        let b = record("test", "b", None, 1);
        index.insert(&a);
        index.insert(&b);
        assert_eq!(index.get(&IndexKey::single("test")).count(), 2);

        index.remove(&a);
        assert_eq!(index.get(&IndexKey::single("test")).count(), 1);
        index.remove(&b);
        assert!(index.is_empty());
    }

    #[test]
    fn test_value_matches_field() {
        let r = record("test", "subject", Some("object"), 5);
        assert!(IndexValue::from("test").matches(&r, Field::Type));
        assert!(IndexValue::from("object").matches(&r, Field::Object));
        assert!(IndexValue::Int(5).matches(&r, Field::Timestamp));
        assert!(!IndexValue::Int(5).matches(&r, Field::Subject));
        assert!(!IndexValue::from("none").matches(&r, Field::Object));
    }
}
