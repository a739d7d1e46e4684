//! Reversible mutation journal
//!
//! While a group is open every mutating primitive of [`Scene`] appends the
//! information needed to reverse it. A group ends either in
//! [`Scene::commit_group`], which hands the entries back as an
//! [`UndoGroup`], or in [`Scene::rollback_group`], which replays the
//! inverses newest-first.
//!
//! Slots vacated by a destroy stay reserved while their inverse may still be
//! replayed, so restored objects come back under the same handles.

use crate::component::{Component, FieldPath, FieldValue};
use crate::error::SceneError;
use crate::geometry::Geometry;
use crate::id::{ComponentId, NodeId};
use crate::node::Node;
use crate::scene::Scene;

/// Subtree removed by [`Scene::destroy`], kept for restoration
#[derive(Debug, Clone)]
pub(crate) struct DetachedSubtree {
    pub(crate) root: NodeId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) index: usize,
    pub(crate) nodes: Vec<(NodeId, Node)>,
    pub(crate) components: Vec<(ComponentId, Component)>,
}

/// Journal entry; each variant holds the state needed to reverse one primitive
#[derive(Debug, Clone)]
pub(crate) enum Mutation {
    NodeCreated {
        node: NodeId,
    },
    ComponentAdded {
        component: ComponentId,
    },
    Destroyed(Box<DetachedSubtree>),
    Reparented {
        node: NodeId,
        parent: Option<NodeId>,
        index: usize,
    },
    Renamed {
        node: NodeId,
        name: String,
    },
    ActiveChanged {
        node: NodeId,
        active: bool,
    },
    GeometryChanged {
        node: NodeId,
        geometry: Geometry,
    },
    FieldWritten {
        component: ComponentId,
        path: FieldPath,
        previous: Option<FieldValue>,
    },
}

/// Open recording group
#[derive(Debug, Clone)]
pub(crate) struct Journal {
    label: String,
    entries: Vec<Mutation>,
}

/// Committed group that can be undone as one step
#[derive(Debug, Clone)]
#[must_use = "dropping an undo group keeps destroyed slots reserved; pass it to Scene::undo or Scene::discard_undo"]
pub struct UndoGroup {
    label: String,
    entries: Vec<Mutation>,
}

impl UndoGroup {
    /// Group label given to [`Scene::begin_group`]
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of recorded primitives
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Scene {
    /// Start recording mutations into a new group
    ///
    /// # Errors
    /// Returns [`SceneError::GroupAlreadyOpen`] if a group is recording
    pub fn begin_group(&mut self, label: impl Into<String>) -> Result<(), SceneError> {
        if let Some(journal) = &self.journal {
            return Err(SceneError::GroupAlreadyOpen(journal.label.clone()));
        }
        self.journal = Some(Journal {
            label: label.into(),
            entries: Vec::new(),
        });
        Ok(())
    }

    /// Check if a group is recording
    #[inline]
    #[must_use]
    pub fn has_open_group(&self) -> bool {
        self.journal.is_some()
    }

    /// Close the open group, keeping its effects
    ///
    /// # Errors
    /// Returns [`SceneError::NoOpenGroup`] if nothing is recording
    pub fn commit_group(&mut self) -> Result<UndoGroup, SceneError> {
        let journal = self.journal.take().ok_or(SceneError::NoOpenGroup)?;
        tracing::debug!(
            "committed undo group '{}' ({} entries)",
            journal.label,
            journal.entries.len()
        );
        Ok(UndoGroup {
            label: journal.label,
            entries: journal.entries,
        })
    }

    /// Close the open group, reverting everything it recorded
    ///
    /// # Errors
    /// Returns [`SceneError::NoOpenGroup`] if nothing is recording, or the
    /// first inverse that could not be applied
    pub fn rollback_group(&mut self) -> Result<(), SceneError> {
        let journal = self.journal.take().ok_or(SceneError::NoOpenGroup)?;
        tracing::debug!(
            "rolling back undo group '{}' ({} entries)",
            journal.label,
            journal.entries.len()
        );
        self.revert_all(journal.entries)
    }

    /// Revert a committed group
    ///
    /// # Errors
    /// - [`SceneError::GroupAlreadyOpen`] while another group is recording
    /// - [`SceneError::StaleUndoGroup`] if objects the group touched were
    ///   removed or released since it was committed
    pub fn undo(&mut self, group: UndoGroup) -> Result<(), SceneError> {
        if let Some(journal) = &self.journal {
            return Err(SceneError::GroupAlreadyOpen(journal.label.clone()));
        }
        self.check_undoable(&group)?;
        tracing::debug!("undoing group '{}' ({} entries)", group.label, group.len());
        self.revert_all(group.entries)
    }

    /// Drop a committed group for good, releasing the slots it kept reserved
    pub fn discard_undo(&mut self, group: UndoGroup) {
        for entry in group.entries {
            if let Mutation::Destroyed(subtree) = entry {
                self.release_subtree(&subtree);
            }
        }
    }

    /// Append to the open group; without one, destroyed slots are released at once
    pub(crate) fn record(&mut self, mutation: Mutation) {
        if let Some(journal) = &mut self.journal {
            journal.entries.push(mutation);
        } else if let Mutation::Destroyed(subtree) = mutation {
            self.release_subtree(&subtree);
        }
    }

    fn release_subtree(&mut self, subtree: &DetachedSubtree) {
        for (id, _) in &subtree.components {
            self.components.release(*id);
        }
        for (id, _) in &subtree.nodes {
            self.nodes.release(*id);
        }
    }

    fn check_undoable(&self, group: &UndoGroup) -> Result<(), SceneError> {
        let node_ok = |id: NodeId| self.nodes.contains(id) || self.nodes.is_reserved(id);
        let component_ok =
            |id: ComponentId| self.components.contains(id) || self.components.is_reserved(id);
        let stale = |reason: String| SceneError::StaleUndoGroup {
            label: group.label.clone(),
            reason,
        };

        for entry in &group.entries {
            match entry {
                Mutation::NodeCreated { node }
                | Mutation::Renamed { node, .. }
                | Mutation::ActiveChanged { node, .. }
                | Mutation::GeometryChanged { node, .. } => {
                    if !node_ok(*node) {
                        return Err(stale(format!("node {node} is gone")));
                    }
                }
                Mutation::Reparented { node, parent, .. } => {
                    if !node_ok(*node) || parent.is_some_and(|p| !node_ok(p)) {
                        return Err(stale(format!("node {node} or its parent is gone")));
                    }
                }
                Mutation::ComponentAdded { component }
                | Mutation::FieldWritten { component, .. } => {
                    if !component_ok(*component) {
                        return Err(stale(format!("component {component} is gone")));
                    }
                }
                Mutation::Destroyed(subtree) => {
                    if let Some((id, _)) = subtree
                        .nodes
                        .iter()
                        .find(|(id, _)| !self.nodes.is_reserved(*id))
                    {
                        return Err(stale(format!("slot of destroyed node {id} was released")));
                    }
                }
            }
        }
        Ok(())
    }

    fn revert_all(&mut self, entries: Vec<Mutation>) -> Result<(), SceneError> {
        for entry in entries.into_iter().rev() {
            self.revert(entry)?;
        }
        Ok(())
    }

    fn revert(&mut self, entry: Mutation) -> Result<(), SceneError> {
        match entry {
            Mutation::NodeCreated { node } => {
                self.detach(node)?;
                self.nodes.take(node);
                self.nodes.release(node);
            }
            Mutation::ComponentAdded { component } => {
                let owner = self
                    .components
                    .get(component)
                    .ok_or(SceneError::UnknownComponent(component))?
                    .owner;
                if let Some(node) = self.nodes.get_mut(owner) {
                    node.components.retain(|&id| id != component);
                }
                self.components.take(component);
                self.components.release(component);
            }
            Mutation::Destroyed(subtree) => {
                let DetachedSubtree {
                    root,
                    parent,
                    index,
                    nodes,
                    components,
                } = *subtree;
                for (id, node) in nodes {
                    self.nodes
                        .restore(id, node)
                        .map_err(|_| SceneError::UnknownNode(id))?;
                }
                for (id, component) in components {
                    self.components
                        .restore(id, component)
                        .map_err(|_| SceneError::UnknownComponent(id))?;
                }
                self.attach(root, parent, Some(index))?;
            }
            Mutation::Reparented {
                node,
                parent,
                index,
            } => {
                self.detach(node)?;
                self.attach(node, parent, Some(index))?;
            }
            Mutation::Renamed { node, name } => self.get_mut(node)?.name = name,
            Mutation::ActiveChanged { node, active } => self.get_mut(node)?.active = active,
            Mutation::GeometryChanged { node, geometry } => self.get_mut(node)?.geometry = geometry,
            Mutation::FieldWritten {
                component,
                path,
                previous,
            } => {
                let fields = &mut self.component_mut(component)?.fields;
                match previous {
                    Some(value) => {
                        fields.insert(path, value);
                    }
                    None => {
                        fields.shift_remove(&path);
                    }
                }
            }
        }
        Ok(())
    }
}
