// Shared fixtures and generators for docwire integration tests

#![allow(dead_code)]

use std::collections::BTreeMap;

use docwire::{ArrayValue, Blob, DocumentData, GeoPoint, MapValue, Timestamp, Value};
use proptest::prelude::*;

/// Scoreboard entry with the score under a capitalized document name.
#[derive(DocumentData, Debug, Default, Clone, PartialEq)]
pub struct GameResult {
    pub name: String,
    #[document(rename = "Score")]
    pub score: i32,
}

/// Record whose `lastUpdate` is always written as the server timestamp.
#[derive(DocumentData, Debug, Default, Clone, PartialEq)]
pub struct SentinelModel {
    pub name: String,
    #[document(rename = "lastUpdate", server_timestamp)]
    pub last_update: Timestamp,
    pub score: i64,
}

#[derive(DocumentData, Debug, Default, Clone, PartialEq)]
pub struct Stats {
    pub wins: u32,
    pub losses: u32,
    pub ratio: Option<f64>,
}

#[derive(DocumentData, Debug, Default, Clone, PartialEq)]
pub struct Player {
    pub name: String,
    pub tags: Vec<String>,
    pub stats: Stats,
    #[document(rename = "joined")]
    pub joined_at: Option<Timestamp>,
    #[document(read_only)]
    pub rank: u32,
    #[document(skip)]
    pub session_token: String,
}

pub fn fields<const N: usize>(entries: [(&str, Value); N]) -> BTreeMap<String, Value> {
    entries
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

pub fn map(entries: impl IntoIterator<Item = (&'static str, Value)>) -> Value {
    Value::Map(entries.into_iter().collect::<MapValue>())
}

pub fn array(values: impl IntoIterator<Item = Value>) -> Value {
    Value::Array(values.into_iter().collect::<ArrayValue>())
}

pub fn timestamp(seconds: i64, nanos: i32) -> Timestamp {
    Timestamp::new(seconds, nanos).unwrap()
}

/// Generate timestamps across the whole supported range
pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
    (-62_135_596_800i64..=253_402_300_799i64, 0i32..1_000_000_000)
        .prop_map(|(seconds, nanos)| Timestamp::new(seconds, nanos).unwrap())
}

/// Generate wire scalars (no containers, no sentinels)
pub fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Boolean),
        any::<i64>().prop_map(Value::Integer),
        any::<f64>()
            .prop_filter("NaN never equals itself", |d| !d.is_nan())
            .prop_map(Value::Double),
        arb_timestamp().prop_map(Value::Timestamp),
        ".{0,20}".prop_map(Value::String),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(|b| Value::Bytes(Blob(b))),
        (-90.0f64..=90.0, -180.0f64..=180.0)
            .prop_map(|(lat, lon)| Value::GeoPoint(GeoPoint::new(lat, lon).unwrap())),
    ]
}

/// Generate well-formed wire trees: arrays never hold arrays directly
pub fn arb_wire_value() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(4, 48, 6, |inner| {
        let element = inner
            .clone()
            .prop_filter("arrays cannot nest", |v| !matches!(v, Value::Array(_)));
        prop_oneof![
            prop::collection::vec(element, 0..6)
                .prop_map(|values| Value::Array(ArrayValue::new(values))),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..6)
                .prop_map(|fields| Value::Map(MapValue::new(fields))),
        ]
    })
}
