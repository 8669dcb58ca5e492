//! Boundary Value Model
//!
//! [`StructuredValue`] is the canonical representation of every value that
//! crosses between the script host and native code.
//!
//! # Type Mapping
//!
//! | Host value | StructuredValue |
//! |------------|-----------------|
//! | null | `Null` |
//! | boolean | `Bool` |
//! | whole number in the safe integer range, BigInt fitting i64 | `Integer` |
//! | any other number | `Number` |
//! | string | `String` |
//! | array | `Sequence` |
//! | plain object | `Mapping` |
//!
//! # Numeric Equality
//!
//! The host has a single number type, so `Integer(2)` and `Number(2.0)` are the
//! same host value. Equality treats them as equal, and treats `NaN` as equal to
//! itself, so that decoding an encoded value always compares equal to the
//! original.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A value crossing the host/native boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StructuredValue {
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    String(String),
    Sequence(Vec<StructuredValue>),
    Mapping(BTreeMap<String, StructuredValue>),
}

impl StructuredValue {
    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            StructuredValue::Null => "null",
            StructuredValue::Bool(_) => "boolean",
            StructuredValue::Integer(_) => "integer",
            StructuredValue::Number(_) => "number",
            StructuredValue::String(_) => "string",
            StructuredValue::Sequence(_) => "sequence",
            StructuredValue::Mapping(_) => "mapping",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StructuredValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StructuredValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StructuredValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StructuredValue::Integer(i) => Some(*i as f64),
            StructuredValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the value as an `i64` if it is an integer, or a number that
    /// represents a whole value inside the `i64` range.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            StructuredValue::Integer(i) => Some(*i),
            StructuredValue::Number(n) => {
                // i64::MAX as f64 rounds up to 2^63, which is out of range
                if n.is_finite() && n.fract() == 0.0 && *n >= i64::MIN as f64 && *n < i64::MAX as f64 {
                    Some(*n as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[StructuredValue]> {
        match self {
            StructuredValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<String, StructuredValue>> {
        match self {
            StructuredValue::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a key on a mapping; `None` for missing keys and non-mappings.
    pub fn get(&self, key: &str) -> Option<&StructuredValue> {
        self.as_mapping().and_then(|map| map.get(key))
    }
}

impl PartialEq for StructuredValue {
    fn eq(&self, other: &Self) -> bool {
        use StructuredValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Integer(i), Number(n)) | (Number(n), Integer(i)) => (*i as f64) == *n,
            (Number(a), Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (String(a), String(b)) => a == b,
            (Sequence(a), Sequence(b)) => a == b,
            (Mapping(a), Mapping(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for StructuredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            // NaN and infinities have no JSON form
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

impl From<bool> for StructuredValue {
    fn from(b: bool) -> Self {
        StructuredValue::Bool(b)
    }
}

impl From<i64> for StructuredValue {
    fn from(i: i64) -> Self {
        StructuredValue::Integer(i)
    }
}

impl From<f64> for StructuredValue {
    fn from(n: f64) -> Self {
        StructuredValue::Number(n)
    }
}

impl From<&str> for StructuredValue {
    fn from(s: &str) -> Self {
        StructuredValue::String(s.to_string())
    }
}

impl From<String> for StructuredValue {
    fn from(s: String) -> Self {
        StructuredValue::String(s)
    }
}

impl<T: Into<StructuredValue>> From<Vec<T>> for StructuredValue {
    fn from(items: Vec<T>) -> Self {
        StructuredValue::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, StructuredValue>> for StructuredValue {
    fn from(map: BTreeMap<String, StructuredValue>) -> Self {
        StructuredValue::Mapping(map)
    }
}

impl FromIterator<(String, StructuredValue)> for StructuredValue {
    fn from_iter<I: IntoIterator<Item = (String, StructuredValue)>>(iter: I) -> Self {
        StructuredValue::Mapping(iter.into_iter().collect())
    }
}

impl From<serde_json::Value> for StructuredValue {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => StructuredValue::Null,
            serde_json::Value::Bool(b) => StructuredValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => StructuredValue::Integer(i),
                // u64 above i64::MAX and floats both land here
                None => StructuredValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => StructuredValue::String(s),
            serde_json::Value::Array(items) => {
                StructuredValue::Sequence(items.into_iter().map(StructuredValue::from).collect())
            }
            serde_json::Value::Object(obj) => obj
                .into_iter()
                .map(|(k, v)| (k, StructuredValue::from(v)))
                .collect(),
        }
    }
}

impl From<StructuredValue> for serde_json::Value {
    fn from(value: StructuredValue) -> Self {
        match value {
            StructuredValue::Null => serde_json::Value::Null,
            StructuredValue::Bool(b) => serde_json::Value::Bool(b),
            StructuredValue::Integer(i) => serde_json::Value::Number(i.into()),
            StructuredValue::Number(n) => serde_json::Number::from_f64(n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            StructuredValue::String(s) => serde_json::Value::String(s),
            StructuredValue::Sequence(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            StructuredValue::Mapping(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}
