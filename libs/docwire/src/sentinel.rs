use std::collections::BTreeMap;
use std::fmt;

use crate::value::{MapValue, Value};

/// Marker values that carry no document data.
///
/// A sentinel tells the store to compute a field (`ServerTimestamp`) or to
/// remove it (`Delete`). Sentinels are matched by identity: a host value that
/// merely looks like one (say the string `"SERVER_TIMESTAMP"`) stays a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentinel {
    ServerTimestamp,
    Delete,
}

impl Sentinel {
    /// Reserved wire encoding. Total: never fails.
    pub fn to_wire(self) -> Value {
        tracing::trace!(sentinel = %self, "emitting sentinel");
        Value::Sentinel(self)
    }

    pub fn name(self) -> &'static str {
        match self {
            Sentinel::ServerTimestamp => "SERVER_TIMESTAMP",
            Sentinel::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Caller-facing names for the sentinels, for use as field values.
pub struct FieldValue;

impl FieldValue {
    pub const SERVER_TIMESTAMP: Sentinel = Sentinel::ServerTimestamp;
    pub const DELETE: Sentinel = Sentinel::Delete;
}

// ════════════════════════════════════════════════════════════════
//  Extraction
// ════════════════════════════════════════════════════════════════

/// Dotted path to a field inside a document, one segment per nested map.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    fn child(&self, segment: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Self(segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            let simple = segment
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if simple {
                f.write_str(segment)?;
            } else {
                write!(f, "`{}`", segment.replace('\\', "\\\\").replace('`', "\\`"))?;
            }
        }
        Ok(())
    }
}

/// A serialized document split into its data and its sentinel instructions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SentinelSplit {
    /// Fields to write literally. Maps emptied by extraction are dropped.
    pub data: BTreeMap<String, Value>,
    /// Fields to compute on the server.
    pub server_timestamps: Vec<FieldPath>,
    /// Fields to remove.
    pub deletes: Vec<FieldPath>,
}

impl SentinelSplit {
    pub fn has_sentinels(&self) -> bool {
        !self.server_timestamps.is_empty() || !self.deletes.is_empty()
    }
}

/// Separate sentinel fields from plain data, walking nested maps.
///
/// Arrays are copied as-is: the serializer rejects a sentinel anywhere
/// below an array, so none can hide in one.
pub fn extract_sentinels(fields: &BTreeMap<String, Value>) -> SentinelSplit {
    let mut split = SentinelSplit::default();
    let data = walk(fields, &FieldPath::default(), &mut split);
    SentinelSplit { data, ..split }
}

fn walk(
    fields: &BTreeMap<String, Value>,
    prefix: &FieldPath,
    split: &mut SentinelSplit,
) -> BTreeMap<String, Value> {
    let mut data = BTreeMap::new();
    for (name, value) in fields {
        let path = prefix.child(name);
        match value {
            Value::Sentinel(Sentinel::ServerTimestamp) => split.server_timestamps.push(path),
            Value::Sentinel(Sentinel::Delete) => split.deletes.push(path),
            Value::Map(map) if !map.fields.is_empty() => {
                let nested = walk(&map.fields, &path, split);
                if !nested.is_empty() {
                    data.insert(name.clone(), Value::Map(MapValue { fields: nested }));
                }
            }
            other => {
                data.insert(name.clone(), other.clone());
            }
        }
    }
    data
}
