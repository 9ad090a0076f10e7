//! JSON form of wire values, as used by the document store's REST surface.
//!
//! Every value is a single-key object naming its case:
//! `{"stringValue": "Jon"}`, `{"integerValue": "10"}`,
//! `{"mapValue": {"fields": {...}}}`. Integers travel as strings so they
//! survive JSON parsers limited to doubles. Sentinels have no JSON form.

use base64::Engine;
use serde::de::Error as _;
use serde::ser::{Error as _, SerializeMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{Blob, DocumentReference, GeoPoint, Timestamp};
use crate::value::{ArrayValue, MapValue, Value};

#[derive(Serialize, Deserialize)]
struct LatLng {
    #[serde(default)]
    latitude: f64,
    #[serde(default)]
    longitude: f64,
}

fn double_repr(d: f64) -> serde_json::Value {
    if d.is_nan() {
        "NaN".into()
    } else if d == f64::INFINITY {
        "Infinity".into()
    } else if d == f64::NEG_INFINITY {
        "-Infinity".into()
    } else {
        d.into()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Value::Null => map.serialize_entry("nullValue", &())?,
            Value::Boolean(b) => map.serialize_entry("booleanValue", b)?,
            Value::Integer(n) => map.serialize_entry("integerValue", &n.to_string())?,
            Value::Double(d) => map.serialize_entry("doubleValue", &double_repr(*d))?,
            Value::Timestamp(ts) => map.serialize_entry("timestampValue", &ts.to_rfc3339())?,
            Value::String(s) => map.serialize_entry("stringValue", s)?,
            Value::Bytes(blob) => map.serialize_entry(
                "bytesValue",
                &base64::engine::general_purpose::STANDARD.encode(blob.as_bytes()),
            )?,
            Value::Reference(reference) => map.serialize_entry("referenceValue", reference.path())?,
            Value::GeoPoint(point) => map.serialize_entry(
                "geoPointValue",
                &LatLng {
                    latitude: point.latitude(),
                    longitude: point.longitude(),
                },
            )?,
            Value::Array(array) => map.serialize_entry("arrayValue", array)?,
            Value::Map(fields) => map.serialize_entry("mapValue", fields)?,
            Value::Sentinel(sentinel) => {
                return Err(S::Error::custom(format!(
                    "sentinel {sentinel} has no JSON wire form; extract it before encoding"
                )));
            }
        }
        map.end()
    }
}

/// Integers arrive as strings, but plain numbers are tolerated.
#[derive(Deserialize)]
#[serde(untagged)]
enum IntegerRepr {
    Text(String),
    Number(i64),
}

/// Doubles arrive as numbers, or as strings for the non-finite values.
#[derive(Deserialize)]
#[serde(untagged)]
enum DoubleRepr {
    Number(f64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
enum Repr {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(IntegerRepr),
    DoubleValue(DoubleRepr),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(LatLng),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

impl Repr {
    fn into_value(self) -> Result<Value, String> {
        Ok(match self {
            Repr::NullValue(()) => Value::Null,
            Repr::BooleanValue(b) => Value::Boolean(b),
            Repr::IntegerValue(IntegerRepr::Number(n)) => Value::Integer(n),
            Repr::IntegerValue(IntegerRepr::Text(text)) => Value::Integer(
                text.parse()
                    .map_err(|e| format!("integerValue '{text}': {e}"))?,
            ),
            Repr::DoubleValue(DoubleRepr::Number(d)) => Value::Double(d),
            Repr::DoubleValue(DoubleRepr::Text(text)) => Value::Double(match text.as_str() {
                "NaN" => f64::NAN,
                "Infinity" => f64::INFINITY,
                "-Infinity" => f64::NEG_INFINITY,
                _ => return Err(format!("doubleValue '{text}' is not a number")),
            }),
            Repr::TimestampValue(text) => {
                Value::Timestamp(Timestamp::parse_rfc3339(&text).map_err(|e| e.to_string())?)
            }
            Repr::StringValue(s) => Value::String(s),
            Repr::BytesValue(text) => Value::Bytes(Blob(
                base64::engine::general_purpose::STANDARD
                    .decode(&text)
                    .map_err(|e| format!("bytesValue: {e}"))?,
            )),
            Repr::ReferenceValue(path) => Value::Reference(DocumentReference::new(path)),
            Repr::GeoPointValue(LatLng { latitude, longitude }) => Value::GeoPoint(
                GeoPoint::new(latitude, longitude).map_err(|e| e.to_string())?,
            ),
            Repr::ArrayValue(array) => Value::Array(array),
            Repr::MapValue(map) => Value::Map(map),
        })
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Repr::deserialize(deserializer)?
            .into_value()
            .map_err(D::Error::custom)
    }
}
