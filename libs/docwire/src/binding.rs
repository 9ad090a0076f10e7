use crate::error::Result;
use crate::host::{Host, NodeId, Shape};
use crate::value::Value;

/// Binding between one record field and its document field.
///
/// Supplied per record type by [`DocumentData::bindings`], normally generated
/// with `#[derive(DocumentData)]`. Wire names must be unique within a type.
pub struct FieldBinding<T> {
    /// Document field name.
    pub name: &'static str,
    pub get: fn(&T) -> &dyn Host,
    /// `None` → the field is never assigned when reading a document.
    pub set: Option<fn(&mut T, &Value) -> Result<()>>,
    /// Write the server-timestamp sentinel instead of the live value.
    pub server_timestamp: bool,
}

/// Record types with an ordered, declared set of document fields.
///
/// Implementing this by hand is the explicit-registration alternative to the
/// derive. A hand-written impl also needs `Host`, usually as
/// `fn shape(&self) -> Shape<'_> { record_shape(self) }`.
pub trait DocumentData: Sized + 'static {
    fn bindings() -> &'static [FieldBinding<Self>];
}

/// One field of a live record, as seen by the serializer.
pub struct BoundField<'a> {
    pub name: &'static str,
    pub value: &'a dyn Host,
    pub server_timestamp: bool,
}

/// Read every bound field of `record`, in binding order.
pub fn bound_fields<T: DocumentData>(record: &T) -> Vec<BoundField<'_>> {
    T::bindings()
        .iter()
        .map(|binding| BoundField {
            name: binding.name,
            value: (binding.get)(record),
            server_timestamp: binding.server_timestamp,
        })
        .collect()
}

/// `Host::shape` for any [`DocumentData`] type.
pub fn record_shape<T: DocumentData>(record: &T) -> Shape<'_> {
    Shape::Record(NodeId::of(record), bound_fields(record))
}

/// Find the binding for a document field name.
pub fn binding_for<T: DocumentData>(name: &str) -> Option<&'static FieldBinding<T>> {
    T::bindings().iter().find(|binding| binding.name == name)
}
