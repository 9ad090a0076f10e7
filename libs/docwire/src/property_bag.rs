use std::fmt;

use crate::host::{Host, NodeId, Shape};

/// Dynamic, insertion-ordered set of named properties.
///
/// For documents whose fields are only known at runtime and whose values
/// mix types, sentinels included.
#[derive(Default)]
pub struct PropertyBag {
    entries: Vec<(String, Box<dyn Host>)>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Set a property, replacing any previous value under the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Host + 'static) -> &mut Self {
        let name = name.into();
        let value: Box<dyn Host> = Box::new(value);
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == &name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
        self
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Host + 'static) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn Host> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_ref())
    }

    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Host>> {
        let index = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Host for PropertyBag {
    fn shape(&self) -> Shape<'_> {
        Shape::Mapping(
            NodeId::of(self),
            self.entries
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_ref() as &dyn Host))
                .collect(),
        )
    }
}

impl fmt::Debug for PropertyBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyBag")
            .field("names", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
