use std::collections::BTreeMap;
use std::fmt;

use crate::binding::BoundField;
use crate::config::SerializerConfig;
use crate::error::{Error, Result};
use crate::host::{Host, HostDateTime, NodeId, Shape, WireRef};
use crate::sentinel::Sentinel;
use crate::types::{Blob, Timestamp};
use crate::value::{ArrayValue, MapValue, Value};

/// Converts host values into wire values.
///
/// Stateless between calls. Every call walks its own input and returns a
/// freshly built tree, so one serializer can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct ValueSerializer {
    config: SerializerConfig,
}

impl ValueSerializer {
    pub fn new(config: SerializerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// Serialize any host value into a single wire value.
    ///
    /// A bare sentinel is rejected: it only means something as a field value.
    pub fn serialize(&self, input: &dyn Host) -> Result<Value> {
        Walk::new(&self.config).value(input, Slot::Root)
    }

    /// Serialize a mapping or record into its document fields directly,
    /// without the enclosing map value.
    pub fn serialize_map(&self, input: &dyn Host) -> Result<BTreeMap<String, Value>> {
        let mut walk = Walk::new(&self.config);
        match input.shape() {
            Shape::Mapping(id, entries) => walk.mapping(id, entries),
            Shape::Record(id, fields) => walk.record(id, fields),
            Shape::Wire(WireRef::Map(map)) => walk.wire_fields(&map.fields),
            Shape::Wire(WireRef::Value(Value::Map(map))) => walk.wire_fields(&map.fields),
            _ => Err(walk.fail(Error::invalid(format!(
                "unable to serialize {} as a map",
                input.type_name()
            )))),
        }
    }
}

/// Where a value sits relative to its parent. Decides whether sentinels and
/// arrays are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Root,
    Element,
    Field,
}

enum Segment {
    Field(String),
    Index(usize),
}

struct Path<'p>(&'p [Segment]);

impl fmt::Display for Path<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Field(name) if i == 0 => f.write_str(name)?,
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// State of one serialize call: the path to the current value, the
/// containers currently open above it and how many of those are arrays.
struct Walk<'c> {
    config: &'c SerializerConfig,
    path: Vec<Segment>,
    open: Vec<NodeId>,
    arrays: usize,
}

impl<'c> Walk<'c> {
    fn new(config: &'c SerializerConfig) -> Self {
        Self {
            config,
            path: Vec::new(),
            open: Vec::new(),
            arrays: 0,
        }
    }

    /// Attach the current path to an error and log the rejection.
    fn fail(&self, err: Error) -> Error {
        if self.path.is_empty() {
            tracing::debug!(error = %err, "value rejected");
            return err;
        }
        let path = Path(&self.path).to_string();
        tracing::debug!(%path, error = %err, "value rejected");
        err.with_context(path)
    }

    fn value(&mut self, host: &dyn Host, slot: Slot) -> Result<Value> {
        match host.shape() {
            Shape::Null => Ok(Value::Null),
            Shape::Sentinel(sentinel) => self.sentinel(sentinel, slot),
            Shape::Bool(b) => Ok(Value::Boolean(b)),
            Shape::Int(n) => Ok(Value::Integer(n)),
            Shape::UInt(n) => match i64::try_from(n) {
                Ok(n) => Ok(Value::Integer(n)),
                Err(_) => Err(self.fail(Error::overflow(format!(
                    "{n} exceeds the largest integer value {}",
                    i64::MAX
                )))),
            },
            Shape::Float(d) => Ok(Value::Double(d)),
            Shape::DateTime(dt) => self.datetime(dt),
            Shape::String(s) => Ok(Value::String(s.into_owned())),
            Shape::Bytes(bytes) => Ok(Value::Bytes(Blob(bytes.to_vec()))),
            Shape::Reference(reference) => Ok(Value::Reference(reference.clone())),
            Shape::GeoPoint(point) => Ok(Value::GeoPoint(point)),
            Shape::Wire(wire) => self.wire(wire, slot),
            Shape::Sequence(id, items) => self.sequence(id, items),
            Shape::Mapping(id, entries) => {
                let fields = self.mapping(id, entries)?;
                Ok(Value::Map(MapValue { fields }))
            }
            Shape::Record(id, bound) => {
                let fields = self.record(id, bound)?;
                Ok(Value::Map(MapValue { fields }))
            }
            Shape::Unsupported => Err(self.fail(Error::invalid(format!(
                "unable to serialize values of type {}",
                host.type_name()
            )))),
        }
    }

    /// Sentinels are field values of maps that have no array above them.
    fn sentinel(&self, sentinel: Sentinel, slot: Slot) -> Result<Value> {
        match slot {
            Slot::Root => Err(self.fail(Error::invalid(format!(
                "sentinel {sentinel} is only valid as a field value"
            )))),
            Slot::Element => Err(self.fail(Error::invalid(format!(
                "sentinel {sentinel} cannot be used inside an array"
            )))),
            Slot::Field if self.arrays > 0 => Err(self.fail(Error::invalid(format!(
                "sentinel {sentinel} cannot be used inside an array"
            )))),
            Slot::Field => Ok(sentinel.to_wire()),
        }
    }

    fn datetime(&self, dt: HostDateTime) -> Result<Value> {
        match dt {
            HostDateTime::Utc(dt) => Timestamp::try_from(dt)
                .map(Value::Timestamp)
                .map_err(|e| self.fail(e)),
            HostDateTime::System(time) => Timestamp::from_system_time(time)
                .map(Value::Timestamp)
                .map_err(|e| self.fail(e)),
            HostDateTime::Local(wall) => Err(self.fail(Error::invalid(format!(
                "date/time {wall} is in the local time zone; convert it to UTC first"
            )))),
            HostDateTime::Unspecified(wall) => Err(self.fail(Error::invalid(format!(
                "date/time {wall} has no time zone; convert it to UTC first"
            )))),
        }
    }

    // ---- containers ----

    fn enter(&mut self, id: NodeId) -> Result<()> {
        if self.open.contains(&id) {
            return Err(self.fail(Error::invalid(format!(
                "cycle detected: {} contains itself",
                id.type_name()
            ))));
        }
        self.open.push(id);
        Ok(())
    }

    fn leave(&mut self) {
        self.open.pop();
    }

    /// Step into a child. Fails once nesting passes `max_depth`.
    fn descend(&mut self, segment: Segment) -> Result<()> {
        if self.path.len() >= self.config.max_depth {
            return Err(self.fail(Error::invalid(format!(
                "nesting exceeds the maximum depth of {}",
                self.config.max_depth
            ))));
        }
        self.path.push(segment);
        Ok(())
    }

    fn ascend(&mut self) {
        self.path.pop();
    }

    fn nested_array(&self) -> Error {
        self.fail(Error::invalid(
            "cannot serialize an array inside another array",
        ))
    }

    fn sequence(&mut self, id: NodeId, items: Vec<&dyn Host>) -> Result<Value> {
        self.enter(id)?;
        self.arrays += 1;
        let mut values = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            self.descend(Segment::Index(index))?;
            let value = self.value(item, Slot::Element)?;
            if matches!(value, Value::Array(_)) {
                return Err(self.nested_array());
            }
            values.push(value);
            self.ascend();
        }
        self.arrays -= 1;
        self.leave();
        Ok(Value::Array(ArrayValue { values }))
    }

    fn mapping(
        &mut self,
        id: NodeId,
        entries: Vec<(&str, &dyn Host)>,
    ) -> Result<BTreeMap<String, Value>> {
        self.enter(id)?;
        let mut fields = BTreeMap::new();
        for (key, host) in entries {
            self.descend(Segment::Field(key.to_string()))?;
            let value = self.value(host, Slot::Field)?;
            self.insert(&mut fields, key, value)?;
            self.ascend();
        }
        self.leave();
        Ok(fields)
    }

    fn record(
        &mut self,
        id: NodeId,
        bound: Vec<BoundField<'_>>,
    ) -> Result<BTreeMap<String, Value>> {
        self.enter(id)?;
        let mut fields = BTreeMap::new();
        for field in bound {
            self.descend(Segment::Field(field.name.to_string()))?;
            // The binding's directive wins over whatever the field holds.
            let value = if field.server_timestamp {
                self.sentinel(Sentinel::ServerTimestamp, Slot::Field)?
            } else {
                self.value(field.value, Slot::Field)?
            };
            self.insert(&mut fields, field.name, value)?;
            self.ascend();
        }
        self.leave();
        Ok(fields)
    }

    fn insert(&self, fields: &mut BTreeMap<String, Value>, key: &str, value: Value) -> Result<()> {
        if fields.insert(key.to_string(), value).is_some() {
            return Err(self.fail(Error::invalid(format!(
                "duplicate field name '{key}'"
            ))));
        }
        Ok(())
    }

    // ---- wire passthrough ----

    /// Validate a wire input in place, then deep-copy it.
    fn wire(&mut self, wire: WireRef<'_>, slot: Slot) -> Result<Value> {
        match wire {
            WireRef::Value(value) => {
                self.check_wire(value, slot)?;
                Ok(value.clone())
            }
            WireRef::Array(array) => {
                self.check_wire_elements(&array.values)?;
                Ok(Value::Array(array.clone()))
            }
            WireRef::Map(map) => {
                self.check_wire_fields(&map.fields)?;
                Ok(Value::Map(map.clone()))
            }
        }
    }

    fn wire_fields(&mut self, fields: &BTreeMap<String, Value>) -> Result<BTreeMap<String, Value>> {
        self.check_wire_fields(fields)?;
        Ok(fields.clone())
    }

    fn check_wire(&mut self, value: &Value, slot: Slot) -> Result<()> {
        match value {
            Value::Sentinel(sentinel) => self.sentinel(*sentinel, slot).map(|_| ()),
            Value::Array(array) => self.check_wire_elements(&array.values),
            Value::Map(map) => self.check_wire_fields(&map.fields),
            _ => Ok(()),
        }
    }

    fn check_wire_elements(&mut self, values: &[Value]) -> Result<()> {
        self.arrays += 1;
        for (index, value) in values.iter().enumerate() {
            self.descend(Segment::Index(index))?;
            if matches!(value, Value::Array(_)) {
                return Err(self.nested_array());
            }
            self.check_wire(value, Slot::Element)?;
            self.ascend();
        }
        self.arrays -= 1;
        Ok(())
    }

    fn check_wire_fields(&mut self, fields: &BTreeMap<String, Value>) -> Result<()> {
        for (key, value) in fields {
            self.descend(Segment::Field(key.clone()))?;
            self.check_wire(value, Slot::Field)?;
            self.ascend();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serialize(input: &dyn Host) -> Result<Value> {
        ValueSerializer::default().serialize(input)
    }

    #[test]
    fn error_carries_field_path() {
        let input = serde_json::json!({ "a": { "b": [1, [2]] } });
        let err = serialize(&input).unwrap_err();
        assert_eq!(
            err,
            Error::invalid("a.b[1]: cannot serialize an array inside another array")
        );
    }

    #[test]
    fn depth_limit_applies() {
        let serializer = ValueSerializer::new(SerializerConfig { max_depth: 2 });
        let shallow = serde_json::json!({ "a": { "b": 1 } });
        assert!(serializer.serialize(&shallow).is_ok());
        let deep = serde_json::json!({ "a": { "b": { "c": 1 } } });
        let err = serializer.serialize(&deep).unwrap_err();
        assert!(err.message().contains("maximum depth of 2"), "{err}");
    }

    #[test]
    fn sentinel_under_an_array_names_its_position() {
        let element: MapValue = [("at", Sentinel::Delete.to_wire())].into_iter().collect();
        let wire = Value::Array(ArrayValue::new(vec![Value::Map(element)]));
        let err = serialize(&wire).unwrap_err();
        assert_eq!(
            err,
            Error::invalid("[0].at: sentinel DELETE cannot be used inside an array")
        );
    }

    #[test]
    fn path_display() {
        let segments = vec![
            Segment::Field("a".into()),
            Segment::Index(3),
            Segment::Field("b".into()),
        ];
        assert_eq!(Path(&segments).to_string(), "a[3].b");
    }
}
