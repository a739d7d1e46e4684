//! Components and their fields
//!
//! A [`Component`] is a typed bundle of fields attached to one node. Fields
//! are either references to other objects in the scene or opaque data.

use crate::id::{ComponentId, NodeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Component type name (e.g. `Button`, `Collider`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentKind(String);

impl ComponentKind {
    #[inline]
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ComponentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentKind {
    fn from(kind: &str) -> Self {
        Self::new(kind)
    }
}

/// Stable path of a field within its component (e.g. `targets.0`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Reference to a scene object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectRef {
    /// A node
    Node(NodeId),
    /// A component attached to some node
    Component(ComponentId),
}

impl Display for ObjectRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(id) => Display::fmt(id, f),
            Self::Component(id) => Display::fmt(id, f),
        }
    }
}

/// Value of a component field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    /// Reference-typed field; `None` is an empty reference
    Reference(Option<ObjectRef>),
    /// Anything else, opaque to the hierarchy
    Data(serde_json::Value),
}

impl FieldValue {
    /// Reference to `node`
    #[inline]
    #[must_use]
    pub fn node(node: NodeId) -> Self {
        Self::Reference(Some(ObjectRef::Node(node)))
    }

    /// Reference to `component`
    #[inline]
    #[must_use]
    pub fn component(component: ComponentId) -> Self {
        Self::Reference(Some(ObjectRef::Component(component)))
    }

    /// Current reference target, if this is a non-empty reference
    #[inline]
    #[must_use]
    pub fn target(&self) -> Option<ObjectRef> {
        match self {
            Self::Reference(target) => *target,
            Self::Data(_) => None,
        }
    }
}

/// Typed bundle of fields attached to a node
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub(crate) kind: ComponentKind,
    pub(crate) owner: NodeId,
    pub(crate) fields: IndexMap<FieldPath, FieldValue>,
}

impl Component {
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    /// Node this component is attached to
    #[inline]
    #[must_use]
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// Field value by path
    #[inline]
    #[must_use]
    pub fn field(&self, path: &FieldPath) -> Option<&FieldValue> {
        self.fields.get(path)
    }

    /// All fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&FieldPath, &FieldValue)> {
        self.fields.iter()
    }
}
