//! Hierarchy nodes

use crate::geometry::Geometry;
use crate::id::{ComponentId, NodeId};

/// Initial state of a node created through [`Scene::create_node`](crate::Scene::create_node)
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub name: String,
    pub active: bool,
    pub geometry: Geometry,
}

impl NodeSpec {
    /// Active node with world geometry
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            geometry: Geometry::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }
}

/// Element of the hierarchy
///
/// Links (parent, children, components) are owned by the scene and only
/// change through its mutating primitives.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) active: bool,
    pub(crate) geometry: Geometry,
    pub(crate) components: Vec<ComponentId>,
}

impl Node {
    pub(crate) fn from_spec(spec: NodeSpec) -> Self {
        Self {
            name: spec.name,
            parent: None,
            children: Vec::new(),
            active: spec.active,
            geometry: spec.geometry,
            components: Vec::new(),
        }
    }

    /// Name; not unique among siblings
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent, or `None` for a top-level node
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in sibling order
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Local active flag
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    #[must_use]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Attached components in attach order
    #[inline]
    #[must_use]
    pub fn components(&self) -> &[ComponentId] {
        &self.components
    }
}
