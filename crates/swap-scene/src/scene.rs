//! The live hierarchy
//!
//! [`Scene`] owns every node and component. All structural changes go
//! through its mutating primitives, which record their inverse in the open
//! journal group (see [`Scene::begin_group`]).

use crate::component::{Component, ComponentKind, FieldPath, FieldValue, ObjectRef};
use crate::error::SceneError;
use crate::geometry::Geometry;
use crate::id::{Arena, ComponentId, NodeId};
use crate::journal::{DetachedSubtree, Journal, Mutation};
use crate::node::{Node, NodeSpec};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Node hierarchy with attached components
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub(crate) nodes: Arena<NodeId, Node>,
    pub(crate) components: Arena<ComponentId, Component>,
    pub(crate) roots: Vec<NodeId>,
    pub(crate) journal: Option<Journal>,
}

impl Scene {
    /// Create empty scene
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ----- queries -------------------------------------------------------

    #[inline]
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    #[inline]
    #[must_use]
    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id)
    }

    /// Check if the node is alive
    #[inline]
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    /// Check if the component is alive
    #[inline]
    #[must_use]
    pub fn contains_component(&self, id: ComponentId) -> bool {
        self.components.contains(id)
    }

    /// Top-level nodes in order
    #[inline]
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Number of live nodes
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live components
    #[inline]
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Look up a live node
    ///
    /// # Errors
    /// Returns [`SceneError::UnknownNode`] for dead handles
    pub fn get(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.nodes.get(id).ok_or(SceneError::UnknownNode(id))
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.nodes.get_mut(id).ok_or(SceneError::UnknownNode(id))
    }

    pub(crate) fn component_mut(&mut self, id: ComponentId) -> Result<&mut Component, SceneError> {
        self.components
            .get_mut(id)
            .ok_or(SceneError::UnknownComponent(id))
    }

    /// Parent of a node
    ///
    /// # Errors
    /// Returns [`SceneError::UnknownNode`] for dead handles
    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, SceneError> {
        Ok(self.get(id)?.parent)
    }

    /// Children of a node in sibling order
    ///
    /// # Errors
    /// Returns [`SceneError::UnknownNode`] for dead handles
    pub fn children(&self, id: NodeId) -> Result<&[NodeId], SceneError> {
        Ok(&self.get(id)?.children)
    }

    fn siblings(&self, parent: Option<NodeId>) -> Result<&[NodeId], SceneError> {
        match parent {
            Some(parent) => self.children(parent),
            None => Ok(&self.roots),
        }
    }

    /// Position of a node among its siblings (or among the roots)
    ///
    /// # Errors
    /// Returns [`SceneError::UnknownNode`] for dead handles
    pub fn sibling_index(&self, id: NodeId) -> Result<usize, SceneError> {
        let parent = self.parent(id)?;
        self.siblings(parent)?
            .iter()
            .position(|&sibling| sibling == id)
            .ok_or(SceneError::UnknownNode(id))
    }

    /// First child with exactly this name
    ///
    /// # Errors
    /// Returns [`SceneError::UnknownNode`] if `parent` is dead
    pub fn child_named(&self, parent: NodeId, name: &str) -> Result<Option<NodeId>, SceneError> {
        Ok(self
            .children(parent)?
            .iter()
            .copied()
            .find(|&child| self.nodes.get(child).is_some_and(|node| node.name == name)))
    }

    /// First component of `kind` on `node`, in attach order
    #[must_use]
    pub fn component_of_kind(&self, node: NodeId, kind: &ComponentKind) -> Option<ComponentId> {
        self.nodes.get(node)?.components.iter().copied().find(|&id| {
            self.components
                .get(id)
                .is_some_and(|component| &component.kind == kind)
        })
    }

    /// Node that a reference resolves to: the node itself, or a component's owner
    #[must_use]
    pub fn owner_of(&self, target: ObjectRef) -> Option<NodeId> {
        match target {
            ObjectRef::Node(id) => self.contains(id).then_some(id),
            ObjectRef::Component(id) => self.components.get(id).map(|component| component.owner),
        }
    }

    /// `root` and all its descendants, depth-first, parents before children
    ///
    /// # Errors
    /// Returns [`SceneError::UnknownNode`] if `root` is dead
    pub fn subtree(&self, root: NodeId) -> Result<Vec<NodeId>, SceneError> {
        self.get(root)?;
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(node) = self.nodes.get(id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        Ok(order)
    }

    /// Every node in the scene, roots in order, each depth-first
    #[must_use]
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(node) = self.nodes.get(id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }

    /// Check if `node` is `root` or lies below it
    #[must_use]
    pub fn is_in_subtree(&self, node: NodeId, root: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == root {
                return true;
            }
            current = self.nodes.get(id).and_then(|n| n.parent);
        }
        false
    }

    /// Slash-separated name path from the top-level ancestor
    ///
    /// # Errors
    /// Returns [`SceneError::UnknownNode`] for dead handles
    pub fn path_of(&self, id: NodeId) -> Result<String, SceneError> {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            let node = self.get(node)?;
            names.push(node.name.as_str());
            current = node.parent;
        }
        names.reverse();
        Ok(names.join("/"))
    }

    // ----- mutations -----------------------------------------------------

    /// Create a node as the last child of `parent` (or the last root)
    ///
    /// # Errors
    /// Returns [`SceneError::UnknownNode`] if `parent` is dead
    pub fn create_node(
        &mut self,
        spec: NodeSpec,
        parent: Option<NodeId>,
    ) -> Result<NodeId, SceneError> {
        if let Some(parent) = parent {
            self.get(parent)?;
        }
        let id = self.nodes.insert(Node::from_spec(spec));
        self.attach(id, parent, None)?;
        self.record(Mutation::NodeCreated { node: id });
        Ok(id)
    }

    /// Attach a new, field-less component to `node`
    ///
    /// # Errors
    /// Returns [`SceneError::UnknownNode`] if `node` is dead
    pub fn add_component(
        &mut self,
        node: NodeId,
        kind: impl Into<ComponentKind>,
    ) -> Result<ComponentId, SceneError> {
        self.get(node)?;
        let id = self.components.insert(Component {
            kind: kind.into(),
            owner: node,
            fields: IndexMap::new(),
        });
        self.get_mut(node)?.components.push(id);
        self.record(Mutation::ComponentAdded { component: id });
        Ok(id)
    }

    /// Write a component field
    ///
    /// # Errors
    /// Returns [`SceneError::UnknownComponent`] if `component` is dead
    pub fn set_field(
        &mut self,
        component: ComponentId,
        path: impl Into<FieldPath>,
        value: FieldValue,
    ) -> Result<(), SceneError> {
        let path = path.into();
        let fields = &mut self.component_mut(component)?.fields;
        if fields.get(&path) == Some(&value) {
            return Ok(());
        }
        let previous = fields.insert(path.clone(), value);
        self.record(Mutation::FieldWritten {
            component,
            path,
            previous,
        });
        Ok(())
    }

    /// # Errors
    /// Returns [`SceneError::UnknownNode`] if `node` is dead
    pub fn set_name(&mut self, node: NodeId, name: impl Into<String>) -> Result<(), SceneError> {
        let name = name.into();
        let entry = self.get_mut(node)?;
        if entry.name == name {
            return Ok(());
        }
        let previous = std::mem::replace(&mut entry.name, name);
        self.record(Mutation::Renamed {
            node,
            name: previous,
        });
        Ok(())
    }

    /// # Errors
    /// Returns [`SceneError::UnknownNode`] if `node` is dead
    pub fn set_active(&mut self, node: NodeId, active: bool) -> Result<(), SceneError> {
        let entry = self.get_mut(node)?;
        if entry.active == active {
            return Ok(());
        }
        entry.active = active;
        self.record(Mutation::ActiveChanged {
            node,
            active: !active,
        });
        Ok(())
    }

    /// # Errors
    /// Returns [`SceneError::UnknownNode`] if `node` is dead
    pub fn set_geometry(&mut self, node: NodeId, geometry: Geometry) -> Result<(), SceneError> {
        let entry = self.get_mut(node)?;
        if entry.geometry == geometry {
            return Ok(());
        }
        let previous = std::mem::replace(&mut entry.geometry, geometry);
        self.record(Mutation::GeometryChanged {
            node,
            geometry: previous,
        });
        Ok(())
    }

    /// Move `node` to the end of `parent`'s children (or of the roots)
    ///
    /// Local geometry is left as-is. Setting the current parent again is a
    /// no-op and keeps the sibling position.
    ///
    /// # Errors
    /// - [`SceneError::UnknownNode`] if either node is dead
    /// - [`SceneError::WouldCreateCycle`] if `parent` lies in `node`'s subtree
    pub fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) -> Result<(), SceneError> {
        let current = self.parent(node)?;
        if let Some(parent) = parent {
            self.get(parent)?;
            if self.is_in_subtree(parent, node) {
                return Err(SceneError::WouldCreateCycle { node, parent });
            }
        }
        if current == parent {
            return Ok(());
        }

        let (previous, index) = self.detach(node)?;
        self.attach(node, parent, None)?;
        self.record(Mutation::Reparented {
            node,
            parent: previous,
            index,
        });
        Ok(())
    }

    /// Move `node` to `index` among its siblings, clamped to the last slot
    ///
    /// # Errors
    /// Returns [`SceneError::UnknownNode`] if `node` is dead
    pub fn set_sibling_index(&mut self, node: NodeId, index: usize) -> Result<(), SceneError> {
        let parent = self.parent(node)?;
        let last = self.siblings(parent)?.len().saturating_sub(1);
        let target = index.min(last);
        let current = self.sibling_index(node)?;
        if current == target {
            return Ok(());
        }

        self.detach(node)?;
        self.attach(node, parent, Some(target))?;
        self.record(Mutation::Reparented {
            node,
            parent,
            index: current,
        });
        Ok(())
    }

    /// Destroy `node`, its whole subtree and every attached component
    ///
    /// Destroying a dead handle is a no-op. References held elsewhere are not
    /// touched and dangle afterwards.
    ///
    /// # Errors
    /// Propagates structural inconsistencies as [`SceneError`]
    pub fn destroy(&mut self, node: NodeId) -> Result<(), SceneError> {
        if !self.contains(node) {
            return Ok(());
        }

        let order = self.subtree(node)?;
        let (parent, index) = self.detach(node)?;
        let mut nodes = Vec::with_capacity(order.len());
        let mut components = Vec::new();
        for id in order {
            if let Some(taken) = self.nodes.take(id) {
                for &component in &taken.components {
                    if let Some(value) = self.components.take(component) {
                        components.push((component, value));
                    }
                }
                nodes.push((id, taken));
            }
        }

        tracing::trace!("destroyed {} ({} nodes)", node, nodes.len());
        self.record(Mutation::Destroyed(Box::new(DetachedSubtree {
            root: node,
            parent,
            index,
            nodes,
            components,
        })));
        Ok(())
    }

    /// Deep-copy `root` from `source` into this scene as the last root
    ///
    /// References between objects of the copied subtree are rewired to the
    /// copies; references leaving it are cleared.
    ///
    /// # Errors
    /// Returns [`SceneError::UnknownNode`] if `root` is not alive in `source`
    pub fn instantiate_from(&mut self, source: &Scene, root: NodeId) -> Result<NodeId, SceneError> {
        let order = source.subtree(root)?;

        let mut node_map: HashMap<NodeId, NodeId> = HashMap::with_capacity(order.len());
        for &original in &order {
            let node = source.get(original)?;
            let parent = match node.parent {
                Some(parent) if original != root => Some(
                    *node_map
                        .get(&parent)
                        .ok_or(SceneError::UnknownNode(parent))?,
                ),
                _ => None,
            };
            let spec = NodeSpec {
                name: node.name.clone(),
                active: node.active,
                geometry: node.geometry,
            };
            let copy = self.create_node(spec, parent)?;
            node_map.insert(original, copy);
        }

        let mut component_map: HashMap<ComponentId, ComponentId> = HashMap::new();
        for &original in &order {
            let copy = node_map[&original];
            for &component in &source.get(original)?.components {
                let value = source
                    .component(component)
                    .ok_or(SceneError::UnknownComponent(component))?;
                let id = self.add_component(copy, value.kind.clone())?;
                // Fields of a freshly added component need no journal entry:
                // undoing the addition removes them along with it.
                self.component_mut(id)?.fields = value.fields.clone();
                component_map.insert(component, id);
            }
        }

        for &id in component_map.values() {
            for value in self.component_mut(id)?.fields.values_mut() {
                if let FieldValue::Reference(Some(target)) = value {
                    let rewired = match *target {
                        ObjectRef::Node(node) => node_map.get(&node).copied().map(ObjectRef::Node),
                        ObjectRef::Component(component) => component_map
                            .get(&component)
                            .copied()
                            .map(ObjectRef::Component),
                    };
                    *value = FieldValue::Reference(rewired);
                }
            }
        }

        Ok(node_map[&root])
    }

    // ----- link maintenance ----------------------------------------------

    /// Remove `node` from its sibling list, returning where it was
    pub(crate) fn detach(&mut self, node: NodeId) -> Result<(Option<NodeId>, usize), SceneError> {
        let parent = self.parent(node)?;
        let siblings = match parent {
            Some(parent) => &mut self.get_mut(parent)?.children,
            None => &mut self.roots,
        };
        let index = siblings
            .iter()
            .position(|&sibling| sibling == node)
            .ok_or(SceneError::UnknownNode(node))?;
        siblings.remove(index);
        self.get_mut(node)?.parent = None;
        Ok((parent, index))
    }

    /// Insert `node` into `parent`'s sibling list at `index` (clamped) or at the end
    pub(crate) fn attach(
        &mut self,
        node: NodeId,
        parent: Option<NodeId>,
        index: Option<usize>,
    ) -> Result<(), SceneError> {
        let siblings = match parent {
            Some(parent) => &mut self.get_mut(parent)?.children,
            None => &mut self.roots,
        };
        match index {
            Some(index) => siblings.insert(index.min(siblings.len()), node),
            None => siblings.push(node),
        }
        self.get_mut(node)?.parent = parent;
        Ok(())
    }
}
