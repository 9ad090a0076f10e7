use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sentinel::Sentinel;
use crate::types::{Blob, DocumentReference, GeoPoint, Timestamp};

/// Wire value: the tagged union exchanged with the document store.
///
/// Owned tree: `clone()` is a deep copy, so a value handed to the serializer
/// never aliases the caller's.
///
/// Invariants upheld by everything the serializer produces:
/// - an `Array` never directly contains another `Array`;
/// - a `Sentinel` only appears as a map field value, never as an array
///   element or at the top level.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Timestamp(Timestamp),
    String(String),
    Bytes(Blob),
    Reference(DocumentReference),
    GeoPoint(GeoPoint),
    Array(ArrayValue),
    Map(MapValue),
    /// Reserved encoding for server-side instructions. Has no data form.
    Sentinel(Sentinel),
}

/// Ordered sequence of wire values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
}

/// String-keyed wire values. Key order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Value>,
}

/// Discriminant of [`Value`], for messages and dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Boolean,
    Integer,
    Double,
    Timestamp,
    String,
    Bytes,
    Reference,
    GeoPoint,
    Array,
    Map,
    Sentinel,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Null => "null",
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
            ValueType::Double => "double",
            ValueType::Timestamp => "timestamp",
            ValueType::String => "string",
            ValueType::Bytes => "bytes",
            ValueType::Reference => "reference",
            ValueType::GeoPoint => "geo point",
            ValueType::Array => "array",
            ValueType::Map => "map",
            ValueType::Sentinel => "sentinel",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Integer(_) => ValueType::Integer,
            Value::Double(_) => ValueType::Double,
            Value::Timestamp(_) => ValueType::Timestamp,
            Value::String(_) => ValueType::String,
            Value::Bytes(_) => ValueType::Bytes,
            Value::Reference(_) => ValueType::Reference,
            Value::GeoPoint(_) => ValueType::GeoPoint,
            Value::Array(_) => ValueType::Array,
            Value::Map(_) => ValueType::Map,
            Value::Sentinel(_) => ValueType::Sentinel,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, Value::Sentinel(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(&a.values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(&m.fields),
            _ => None,
        }
    }
}

impl ArrayValue {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }
}

impl MapValue {
    pub fn new(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }
}

impl FromIterator<Value> for ArrayValue {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for MapValue {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// From impls: literal construction of wire values
// ---------------------------------------------------------------------------

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
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

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<Blob> for Value {
    fn from(b: Blob) -> Self {
        Value::Bytes(b)
    }
}

impl From<GeoPoint> for Value {
    fn from(p: GeoPoint) -> Self {
        Value::GeoPoint(p)
    }
}

impl From<DocumentReference> for Value {
    fn from(r: DocumentReference) -> Self {
        Value::Reference(r)
    }
}

impl From<ArrayValue> for Value {
    fn from(a: ArrayValue) -> Self {
        Value::Array(a)
    }
}

impl From<MapValue> for Value {
    fn from(m: MapValue) -> Self {
        Value::Map(m)
    }
}
