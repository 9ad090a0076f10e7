//! Wire values back into host types.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::binding::DocumentData;
use crate::error::{Error, Result};
use crate::types::{Blob, DocumentReference, GeoPoint, Timestamp};
use crate::value::{Value, ValueType};

/// Host types that can be rebuilt from a wire value.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self>;
}

/// Read a host value out of a wire value.
pub fn deserialize<T: FromValue>(value: &Value) -> Result<T> {
    T::from_value(value)
}

/// Build a record from document fields.
///
/// Starts from `T::default()` and assigns each bound field that is present
/// and has a setter. Document fields with no binding are skipped.
pub fn from_map<T: DocumentData + Default>(fields: &BTreeMap<String, Value>) -> Result<T> {
    let bindings = T::bindings();
    let mut record = T::default();
    for binding in bindings {
        let (Some(set), Some(value)) = (binding.set, fields.get(binding.name)) else {
            continue;
        };
        set(&mut record, value)?;
    }
    for name in fields.keys() {
        if !bindings.iter().any(|binding| binding.name == name.as_str()) {
            tracing::warn!(
                field = %name,
                record = std::any::type_name::<T>(),
                "ignoring unknown field"
            );
        }
    }
    Ok(record)
}

/// `FromValue` for any [`DocumentData`] record: the value must be a map.
pub fn record_from_value<T: DocumentData + Default>(value: &Value) -> Result<T> {
    match value {
        Value::Map(map) => from_map(&map.fields),
        other => Err(mismatch(ValueType::Map, other)),
    }
}

fn mismatch(expected: ValueType, found: &Value) -> Error {
    match found {
        Value::Sentinel(sentinel) => {
            Error::invalid(format!("sentinel {sentinel} has no {expected} value"))
        }
        _ => Error::invalid(format!("expected {expected}, found {}", found.value_type())),
    }
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_bool()
            .ok_or_else(|| mismatch(ValueType::Boolean, value))
    }
}

macro_rules! from_value_int {
    ($($t:ty),*) => {$(
        impl FromValue for $t {
            fn from_value(value: &Value) -> Result<Self> {
                let n = value
                    .as_i64()
                    .ok_or_else(|| mismatch(ValueType::Integer, value))?;
                <$t>::try_from(n).map_err(|_| {
                    Error::overflow(format!("{n} does not fit in {}", stringify!($t)))
                })
            }
        }
    )*};
}

from_value_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Double(d) => Ok(*d),
            Value::Integer(n) => Ok(*n as f64),
            other => Err(mismatch(ValueType::Double, other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self> {
        f64::from_value(value).map(|d| d as f32)
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch(ValueType::String, value))
    }
}

impl FromValue for Blob {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bytes(blob) => Ok(blob.clone()),
            other => Err(mismatch(ValueType::Bytes, other)),
        }
    }
}

impl FromValue for Timestamp {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Timestamp(ts) => Ok(*ts),
            other => Err(mismatch(ValueType::Timestamp, other)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Result<Self> {
        Timestamp::from_value(value).map(|ts| ts.to_datetime())
    }
}

impl FromValue for GeoPoint {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::GeoPoint(point) => Ok(*point),
            other => Err(mismatch(ValueType::GeoPoint, other)),
        }
    }
}

impl FromValue for DocumentReference {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Reference(reference) => Ok(reference.clone()),
            other => Err(mismatch(ValueType::Reference, other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Box<T> {
    fn from_value(value: &Value) -> Result<Self> {
        T::from_value(value).map(Box::new)
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self> {
        let items = value
            .as_array()
            .ok_or_else(|| mismatch(ValueType::Array, value))?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                T::from_value(item)
                    .map_err(|e| e.with_context(format!("[{i}]")))
            })
            .collect()
    }
}

fn entries<T: FromValue>(
    value: &Value,
) -> Result<impl Iterator<Item = Result<(String, T)>> + '_> {
    let fields = value
        .as_map()
        .ok_or_else(|| mismatch(ValueType::Map, value))?;
    Ok(fields.iter().map(|(k, v)| {
        T::from_value(v)
            .map(|v| (k.clone(), v))
            .map_err(|e| e.with_context(k))
    }))
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(value: &Value) -> Result<Self> {
        entries(value)?.collect()
    }
}

impl<T: FromValue> FromValue for HashMap<String, T> {
    fn from_value(value: &Value) -> Result<Self> {
        entries(value)?.collect()
    }
}
