//! Host shapes: how an in-memory value presents itself to the serializer.
//!
//! Every serializable type implements [`Host`] and reports exactly one
//! [`Shape`]. The serializer then matches on the shape in a fixed order, so
//! dispatch never depends on which trait impls happen to be in scope.

use std::borrow::Cow;
use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::rc::Rc;
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Utc};

use crate::binding::BoundField;
use crate::sentinel::Sentinel;
use crate::types::{Blob, DocumentReference, GeoPoint, Timestamp};
use crate::value::{ArrayValue, MapValue, Value};

/// A value the serializer knows how to inspect.
pub trait Host {
    fn shape(&self) -> Shape<'_>;

    /// Concrete type name, used in error messages.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Runtime category of a host value.
pub enum Shape<'a> {
    Null,
    Sentinel(Sentinel),
    Bool(bool),
    /// Any signed integer, or an unsigned one narrower than 64 bits.
    Int(i64),
    /// 64-bit unsigned. Range-checked against `i64::MAX`.
    UInt(u64),
    Float(f64),
    DateTime(HostDateTime),
    String(Cow<'a, str>),
    Bytes(&'a [u8]),
    Reference(&'a DocumentReference),
    GeoPoint(GeoPoint),
    /// Already a wire value; copied, never aliased.
    Wire(WireRef<'a>),
    Sequence(NodeId, Vec<&'a dyn Host>),
    Mapping(NodeId, Vec<(&'a str, &'a dyn Host)>),
    /// Typed record, fields in binding order.
    Record(NodeId, Vec<BoundField<'a>>),
    /// No conversion exists (type descriptors, opaque handles, ...).
    Unsupported,
}

/// A date/time together with what is known about its zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostDateTime {
    /// An instant: UTC, or a fixed offset already normalized to UTC.
    Utc(DateTime<Utc>),
    /// A system clock reading, not yet range-checked.
    System(SystemTime),
    /// Wall-clock time in the machine's zone.
    Local(NaiveDateTime),
    /// Wall-clock time with no zone at all.
    Unspecified(NaiveDateTime),
}

/// Borrowed wire input of any of the three wire container types.
#[derive(Debug, Clone, Copy)]
pub enum WireRef<'a> {
    Value(&'a Value),
    Array(&'a ArrayValue),
    Map(&'a MapValue),
}

/// Identity of a container during traversal: address plus concrete type.
///
/// The type name disambiguates a struct from its first field, which share
/// an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId {
    addr: usize,
    type_name: &'static str,
}

impl NodeId {
    pub fn of<T: ?Sized>(node: &T) -> Self {
        Self {
            addr: node as *const T as *const () as usize,
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

impl Host for bool {
    fn shape(&self) -> Shape<'_> {
        Shape::Bool(*self)
    }
}

macro_rules! host_int {
    ($($t:ty),*) => {$(
        impl Host for $t {
            fn shape(&self) -> Shape<'_> {
                Shape::Int(i64::from(*self))
            }
        }
    )*};
}

host_int!(i8, i16, i32, i64, u8, u16, u32);

impl Host for isize {
    fn shape(&self) -> Shape<'_> {
        // isize is at most 64 bits on every supported target.
        Shape::Int(*self as i64)
    }
}

impl Host for u64 {
    fn shape(&self) -> Shape<'_> {
        Shape::UInt(*self)
    }
}

impl Host for usize {
    fn shape(&self) -> Shape<'_> {
        Shape::UInt(*self as u64)
    }
}

impl Host for f32 {
    fn shape(&self) -> Shape<'_> {
        Shape::Float(f64::from(*self))
    }
}

impl Host for f64 {
    fn shape(&self) -> Shape<'_> {
        Shape::Float(*self)
    }
}

impl Host for str {
    fn shape(&self) -> Shape<'_> {
        Shape::String(Cow::Borrowed(self))
    }
}

impl Host for String {
    fn shape(&self) -> Shape<'_> {
        Shape::String(Cow::Borrowed(self))
    }
}

impl Host for char {
    fn shape(&self) -> Shape<'_> {
        Shape::String(Cow::Owned(self.to_string()))
    }
}

impl Host for Blob {
    fn shape(&self) -> Shape<'_> {
        Shape::Bytes(&self.0)
    }
}

impl Host for DocumentReference {
    fn shape(&self) -> Shape<'_> {
        Shape::Reference(self)
    }
}

impl Host for GeoPoint {
    fn shape(&self) -> Shape<'_> {
        Shape::GeoPoint(*self)
    }
}

impl Host for Sentinel {
    fn shape(&self) -> Shape<'_> {
        Shape::Sentinel(*self)
    }
}

// ---------------------------------------------------------------------------
// Date/time
// ---------------------------------------------------------------------------

impl Host for Timestamp {
    fn shape(&self) -> Shape<'_> {
        Shape::DateTime(HostDateTime::Utc(self.to_datetime()))
    }
}

impl Host for DateTime<Utc> {
    fn shape(&self) -> Shape<'_> {
        Shape::DateTime(HostDateTime::Utc(*self))
    }
}

impl Host for DateTime<FixedOffset> {
    fn shape(&self) -> Shape<'_> {
        Shape::DateTime(HostDateTime::Utc(self.with_timezone(&Utc)))
    }
}

impl Host for DateTime<Local> {
    fn shape(&self) -> Shape<'_> {
        Shape::DateTime(HostDateTime::Local(self.naive_local()))
    }
}

impl Host for NaiveDateTime {
    fn shape(&self) -> Shape<'_> {
        Shape::DateTime(HostDateTime::Unspecified(*self))
    }
}

impl Host for SystemTime {
    fn shape(&self) -> Shape<'_> {
        Shape::DateTime(HostDateTime::System(*self))
    }
}

// ---------------------------------------------------------------------------
// Wire passthrough
// ---------------------------------------------------------------------------

impl Host for Value {
    fn shape(&self) -> Shape<'_> {
        Shape::Wire(WireRef::Value(self))
    }
}

impl Host for ArrayValue {
    fn shape(&self) -> Shape<'_> {
        Shape::Wire(WireRef::Array(self))
    }
}

impl Host for MapValue {
    fn shape(&self) -> Shape<'_> {
        Shape::Wire(WireRef::Map(self))
    }
}

// ---------------------------------------------------------------------------
// Wrappers delegate to the wrapped value
// ---------------------------------------------------------------------------

impl<T: Host> Host for Option<T> {
    fn shape(&self) -> Shape<'_> {
        match self {
            Some(inner) => inner.shape(),
            None => Shape::Null,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Some(inner) => inner.type_name(),
            None => std::any::type_name::<Self>(),
        }
    }
}

impl<T: Host> Host for OnceCell<T> {
    fn shape(&self) -> Shape<'_> {
        match self.get() {
            Some(inner) => inner.shape(),
            None => Shape::Null,
        }
    }
}

macro_rules! host_deref {
    ($($wrapper:ident),*) => {$(
        impl<T: Host + ?Sized> Host for $wrapper<T> {
            fn shape(&self) -> Shape<'_> {
                (**self).shape()
            }

            fn type_name(&self) -> &'static str {
                (**self).type_name()
            }
        }
    )*};
}

host_deref!(Box, Rc, Arc);

impl<T: Host + ?Sized> Host for &T {
    fn shape(&self) -> Shape<'_> {
        (**self).shape()
    }

    fn type_name(&self) -> &'static str {
        (**self).type_name()
    }
}

// ---------------------------------------------------------------------------
// Sequences
// ---------------------------------------------------------------------------

fn sequence<'a, T: Host + 'a>(id: NodeId, items: impl IntoIterator<Item = &'a T>) -> Shape<'a> {
    Shape::Sequence(
        id,
        items.into_iter().map(|item| item as &dyn Host).collect(),
    )
}

impl<T: Host> Host for [T] {
    fn shape(&self) -> Shape<'_> {
        sequence(NodeId::of(self), self)
    }
}

impl<T: Host, const N: usize> Host for [T; N] {
    fn shape(&self) -> Shape<'_> {
        sequence(NodeId::of(self), self)
    }
}

impl<T: Host> Host for Vec<T> {
    fn shape(&self) -> Shape<'_> {
        sequence(NodeId::of(self), self)
    }
}

impl<T: Host> Host for VecDeque<T> {
    fn shape(&self) -> Shape<'_> {
        sequence(NodeId::of(self), self)
    }
}

impl<T: Host> Host for BTreeSet<T> {
    fn shape(&self) -> Shape<'_> {
        sequence(NodeId::of(self), self)
    }
}

// ---------------------------------------------------------------------------
// Mappings
// ---------------------------------------------------------------------------

impl<K: AsRef<str>, V: Host, S> Host for HashMap<K, V, S> {
    fn shape(&self) -> Shape<'_> {
        Shape::Mapping(
            NodeId::of(self),
            self.iter()
                .map(|(k, v)| (k.as_ref(), v as &dyn Host))
                .collect(),
        )
    }
}

impl<K: AsRef<str>, V: Host> Host for BTreeMap<K, V> {
    fn shape(&self) -> Shape<'_> {
        Shape::Mapping(
            NodeId::of(self),
            self.iter()
                .map(|(k, v)| (k.as_ref(), v as &dyn Host))
                .collect(),
        )
    }
}

/// Dynamic JSON documents serialize like the equivalent host values.
impl Host for serde_json::Value {
    fn shape(&self) -> Shape<'_> {
        use serde_json::Value as Json;
        match self {
            Json::Null => Shape::Null,
            Json::Bool(b) => Shape::Bool(*b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Shape::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Shape::UInt(u)
                } else {
                    Shape::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Json::String(s) => Shape::String(Cow::Borrowed(s)),
            Json::Array(items) => sequence(NodeId::of(self), items),
            Json::Object(map) => Shape::Mapping(
                NodeId::of(self),
                map.iter()
                    .map(|(k, v)| (k.as_str(), v as &dyn Host))
                    .collect(),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Type descriptors
// ---------------------------------------------------------------------------

/// A type, as opposed to an instance of it, has no document form.
impl Host for std::any::TypeId {
    fn shape(&self) -> Shape<'_> {
        Shape::Unsupported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_distinguishes_struct_from_first_field() {
        struct Outer {
            inner: Vec<i32>,
        }
        let outer = Outer { inner: vec![1] };
        assert_ne!(NodeId::of(&outer), NodeId::of(&outer.inner));
        assert_eq!(NodeId::of(&outer.inner), NodeId::of(&outer.inner));
    }

    #[test]
    fn wrappers_delegate() {
        let boxed: Box<dyn Host> = Box::new(7u8);
        assert!(matches!(boxed.shape(), Shape::Int(7)));
        assert!(matches!(None::<i32>.shape(), Shape::Null));
        assert_eq!(Some(1u64).type_name(), "u64");

        let cell: OnceCell<String> = OnceCell::new();
        assert!(matches!(cell.shape(), Shape::Null));
    }

    #[test]
    fn json_numbers_keep_their_category() {
        let json = serde_json::json!([1, -1, 18446744073709551615u64, 1.5]);
        let Shape::Sequence(_, items) = json.shape() else {
            panic!("expected sequence");
        };
        assert!(matches!(items[0].shape(), Shape::Int(1)));
        assert!(matches!(items[1].shape(), Shape::Int(-1)));
        assert!(matches!(items[2].shape(), Shape::UInt(u64::MAX)));
        assert!(matches!(items[3].shape(), Shape::Float(f) if f == 1.5));
    }
}
