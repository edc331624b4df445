//! Payload values carried by records
//!
//! A record's `data` is opaque to the store: it is written, read back and
//! snapshotted, but never indexed or filtered on. [`Value`] is the
//! structured form of that payload and has exactly the shape of a JSON
//! document; it serializes as plain JSON, not as a tagged enum.
//!
//! JSON has no NaN or infinity, so a payload holding one cannot be stored.
//! [`Value::is_finite`] reports whether a payload survives serialization.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Structured payload value
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "serde_json::Value", from = "serde_json::Value")]
pub enum Value {
    /// JSON null
    Null,
    /// Boolean
    Bool(bool),
    /// Number that fits in an i64
    Int(i64),
    /// Any other number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Array of values
    Array(Vec<Value>),
    /// Object with string keys
    Object(HashMap<String, Value>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            _ => false,
        }
    }
}

impl Value {
    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether every number in this value, at any depth, is finite
    pub fn is_finite(&self) -> bool {
        match self {
            Value::Float(f) => f.is_finite(),
            Value::Array(items) => items.iter().all(Value::is_finite),
            Value::Object(fields) => fields.values().all(Value::is_finite),
            _ => true,
        }
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a field of an Object value
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self {
            Value::Object(fields) => fields.get(field),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(fields: HashMap<String, Value>) -> Self {
        Value::Object(fields)
    }
}

impl From<serde_json::Value> for Value {
    fn from(doc: serde_json::Value) -> Self {
        match doc {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .or_else(|| n.as_f64().map(Value::Float))
                .unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::Value::Number(i.into()),
            // Non-finite floats have no JSON form
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Object(fields) => serde_json::Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_int_and_float_differ() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Null, Value::Bool(false));
    }

    #[test]
    fn test_object_equality_ignores_insertion_order() {
        let a = Value::from(json!({"x": 1, "y": "two"}));
        let b = Value::from(json!({"y": "two", "x": 1}));
        assert_eq!(a, b);
    }

    #[test]
    fn test_get_field() {
        let v = Value::from(json!({"test": "data"}));
        assert_eq!(v.get("test").and_then(Value::as_str), Some("data"));
        assert!(v.get("missing").is_none());
        assert!(Value::Int(3).get("test").is_none());
    }

    #[test]
    fn test_serializes_as_plain_json() {
        let value = Value::from(json!({"test": "data", "n": [1, 2.5, null]}));
        let text = serde_json::to_string(&value).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc, json!({"test": "data", "n": [1, 2.5, null]}));

        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_float_stays_float() {
        let back: Value = serde_json::from_str("2.0").unwrap();
        assert_eq!(back, Value::Float(2.0));
        let back: Value = serde_json::from_str("2").unwrap();
        assert_eq!(back, Value::Int(2));
    }

    #[test]
    fn test_is_finite() {
        assert!(Value::from(json!({"a": [1, 1.5, "x"]})).is_finite());
        assert!(!Value::Float(f64::NAN).is_finite());
        assert!(!Value::Array(vec![Value::Float(f64::INFINITY)]).is_finite());
        let nested = Value::Object(HashMap::from([(
            "deep".to_string(),
            Value::Array(vec![Value::Float(f64::NEG_INFINITY)]),
        )]));
        assert!(!nested.is_finite());
    }

    #[test]
    fn test_non_finite_serializes_as_null() {
        let text = serde_json::to_string(&Value::Float(f64::NAN)).unwrap();
        assert_eq!(text, "null");
    }
}
