//! Per-class registries of materialized accessors.

use std::{
    fmt,
    sync::{Arc, LazyLock, RwLock},
};

use indexmap::IndexSet;

use crate::fields::FieldName;

/// The set of field names whose accessors have been materialized for one
/// exact record class. Every record built from the same `Shape` shares it,
/// so registering a field once makes its accessors answerable from all
/// instances, past and future, of that class.
///
/// Shape identity is class identity: records compare equal only when their
/// `Arc<Shape>` handles point at the same shape.
pub struct Shape {
    name: Arc<str>,
    accessors: RwLock<IndexSet<FieldName>>,
}

static BASE: LazyLock<Arc<Shape>> = LazyLock::new(|| Shape::new("Record"));

impl Shape {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: Arc::from(name),
            accessors: RwLock::new(IndexSet::new()),
        })
    }

    /// The default class, used by [`crate::Record::new`].
    pub fn base() -> Arc<Self> {
        BASE.clone()
    }

    /// Derive a child class. Registries are per-exact-class: the child's
    /// starts empty, and sibling subclasses never observe each other's
    /// accessors.
    pub fn subshape(self: &Arc<Self>, name: &str) -> Arc<Self> {
        Self::new(name)
    }

    pub fn name(&self) -> Arc<str> {
        self.name.clone()
    }

    /// Register accessors for `field` if not already present. Idempotent;
    /// concurrent first-time registrations from different instances of this
    /// class are serialized by the write lock.
    pub(crate) fn materialize(&self, field: FieldName) {
        let mut accessors = self.accessors.write().unwrap();
        accessors.insert(field);
    }

    pub fn knows(&self, field: FieldName) -> bool {
        self.accessors.read().unwrap().contains(&field)
    }

    /// Field names with materialized accessors, in registration order.
    pub fn accessor_fields(&self) -> Vec<FieldName> {
        self.accessors.read().unwrap().iter().copied().collect()
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("name", &self.name)
            .field("accessors", &self.accessor_fields())
            .finish()
    }
}
