//! Identity lookup: which selected root owns a node
//!
//! Built once per run, before any mutation, by flattening every selected
//! subtree. Because selections may not nest, each node maps to at most one
//! root.

use crate::error::LookupError;
use crate::selection::Selection;
use std::collections::HashMap;
use swap_scene::{NodeId, ObjectRef, Scene};

/// Map from every node in the selected subtrees to its selected root
#[derive(Debug, Clone, Default)]
pub struct IdentityLookup {
    owners: HashMap<NodeId, NodeId>,
    flattened: Vec<NodeId>,
}

impl IdentityLookup {
    /// Flatten the selected subtrees of `scene`
    ///
    /// # Errors
    /// - [`LookupError::UnknownNode`] if a selected root is dead
    /// - [`LookupError::NestedSelection`] if one root lies inside another
    pub fn build(scene: &Scene, selection: &Selection) -> Result<Self, LookupError> {
        let mut owners = HashMap::new();
        let mut flattened = Vec::new();

        for root in selection.iter() {
            if !scene.contains(root) {
                return Err(LookupError::UnknownNode(root));
            }
            for node in scene.subtree(root)? {
                if let Some(previous) = owners.insert(node, root) {
                    // Either `root` was reached inside an earlier subtree or
                    // an earlier root is reached inside this one.
                    let (outer, inner) = if node == root {
                        (previous, root)
                    } else {
                        (root, previous)
                    };
                    return Err(LookupError::NestedSelection { outer, inner });
                }
                flattened.push(node);
            }
        }

        tracing::debug!(
            "identity lookup: {} roots, {} nodes",
            selection.len(),
            flattened.len()
        );
        Ok(Self { owners, flattened })
    }

    /// Selected root whose subtree contains `node`
    #[inline]
    #[must_use]
    pub fn owner_of(&self, node: NodeId) -> Option<NodeId> {
        self.owners.get(&node).copied()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.owners.contains_key(&node)
    }

    /// Every node of every selected subtree, root by root, parents first
    #[inline]
    #[must_use]
    pub fn flattened(&self) -> &[NodeId] {
        &self.flattened
    }

    /// Resolve a reference to `(effective target, selected root)`
    ///
    /// Component references resolve through their owning node. Returns
    /// `None` for dead targets and targets outside every selected subtree.
    #[must_use]
    pub fn resolve(&self, scene: &Scene, target: ObjectRef) -> Option<(NodeId, NodeId)> {
        let node = scene.owner_of(target)?;
        self.owner_of(node).map(|root| (node, root))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swap_scene::NodeSpec;

    fn tree() -> (Scene, NodeId, NodeId, NodeId, NodeId) {
        let mut scene = Scene::new();
        let a = scene.create_node(NodeSpec::new("A"), None).unwrap();
        let a1 = scene.create_node(NodeSpec::new("A1"), Some(a)).unwrap();
        let a2 = scene.create_node(NodeSpec::new("A2"), Some(a1)).unwrap();
        let b = scene.create_node(NodeSpec::new("B"), None).unwrap();
        (scene, a, a1, a2, b)
    }

    #[test]
    fn maps_descendants_to_root() {
        let (scene, a, a1, a2, b) = tree();
        let lookup = IdentityLookup::build(&scene, &Selection::new([a]).unwrap()).unwrap();

        assert_eq!(lookup.owner_of(a), Some(a));
        assert_eq!(lookup.owner_of(a1), Some(a));
        assert_eq!(lookup.owner_of(a2), Some(a));
        assert_eq!(lookup.owner_of(b), None);
        assert_eq!(lookup.flattened(), &[a, a1, a2]);
        assert_eq!(lookup.len(), 3);
    }

    #[test]
    fn resolves_component_through_owner() {
        let (mut scene, a, a1, _, b) = tree();
        let comp = scene.add_component(a1, "Image").unwrap();
        let other = scene.add_component(b, "Image").unwrap();
        let lookup = IdentityLookup::build(&scene, &Selection::new([a]).unwrap()).unwrap();

        assert_eq!(lookup.resolve(&scene, ObjectRef::Component(comp)), Some((a1, a)));
        assert_eq!(lookup.resolve(&scene, ObjectRef::Component(other)), None);
        assert_eq!(lookup.resolve(&scene, ObjectRef::Node(a)), Some((a, a)));
    }

    #[test]
    fn rejects_nested_either_order() {
        let (scene, a, a1, _, _) = tree();

        let err = IdentityLookup::build(&scene, &Selection::new([a, a1]).unwrap()).unwrap_err();
        assert_eq!(err, LookupError::NestedSelection { outer: a, inner: a1 });

        let err = IdentityLookup::build(&scene, &Selection::new([a1, a]).unwrap()).unwrap_err();
        assert_eq!(err, LookupError::NestedSelection { outer: a, inner: a1 });
    }

    #[test]
    fn rejects_dead_root() {
        let (mut scene, a, _, _, _) = tree();
        scene.destroy(a).unwrap();

        let err = IdentityLookup::build(&scene, &Selection::new([a]).unwrap()).unwrap_err();
        assert_eq!(err, LookupError::UnknownNode(a));
    }
}
