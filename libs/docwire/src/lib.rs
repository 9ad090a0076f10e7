//! Host values to document-store wire values, and back.
//!
//! ```ignore
//! use docwire::{DocumentData, FieldValue, Timestamp};
//!
//! #[derive(DocumentData, Default)]
//! struct GameResult {
//!     name: String,
//!     #[document(rename = "lastUpdate", server_timestamp)]
//!     last_update: Option<Timestamp>,
//!     score: i32,
//! }
//!
//! let fields = docwire::serialize_map(&GameResult { name: "Jon".into(), ..Default::default() })?;
//! ```

// Lets code generated by the derive refer to `::docwire` inside this crate too.
extern crate self as docwire;

pub mod binding;
pub mod config;
pub mod de;
pub mod error;
pub mod host;
pub mod property_bag;
pub mod sentinel;
pub mod serializer;
pub mod types;
pub mod value;
mod wire_json;

use std::collections::BTreeMap;

pub use docwire_derive::DocumentData;

pub use binding::{DocumentData, FieldBinding};
pub use config::SerializerConfig;
pub use de::{FromValue, deserialize, from_map};
pub use error::{Error, ErrorKind, Result};
pub use host::{Host, Shape};
pub use property_bag::PropertyBag;
pub use sentinel::{FieldPath, FieldValue, Sentinel, SentinelSplit, extract_sentinels};
pub use serializer::ValueSerializer;
pub use types::{Blob, DocumentReference, GeoPoint, Timestamp};
pub use value::{ArrayValue, MapValue, Value, ValueType};

/// Serialize with the default configuration. See [`ValueSerializer::serialize`].
pub fn serialize(input: &dyn Host) -> Result<Value> {
    ValueSerializer::default().serialize(input)
}

/// Serialize with the default configuration. See [`ValueSerializer::serialize_map`].
pub fn serialize_map(input: &dyn Host) -> Result<BTreeMap<String, Value>> {
    ValueSerializer::default().serialize_map(input)
}
