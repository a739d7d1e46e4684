//! Reference scanning
//!
//! Walks every component in the scene once and records each reference field
//! whose target lies inside a selected subtree. The plan is captured before
//! any mutation so that later steps never observe half-replaced state.

use crate::config::EngineConfig;
use crate::lookup::IdentityLookup;
use std::collections::{HashMap, HashSet};
use swap_scene::{
    ComponentId, ComponentKind, FieldPath, NodeId, ObjectRef, ReferenceVisitor, Scene,
    StoredFields,
};

/// What kind of object a reference field expects
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// A node
    Node,
    /// A component of this kind
    Component(ComponentKind),
}

/// One reference field that points into a selected subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSite {
    /// Component holding the field
    pub owner: ComponentId,
    /// Field path within the owner
    pub path: FieldPath,
    /// Value at scan time
    pub target: ObjectRef,
    /// Node the target resolves to (a component's owner, or the node itself)
    pub effective_target: NodeId,
    /// Expected kind of the rewritten value
    pub kind: TargetKind,
}

/// Reference sites grouped by selected root
#[derive(Debug, Clone, Default)]
pub struct ReferencePlan {
    sites: HashMap<NodeId, Vec<ReferenceSite>>,
    len: usize,
}

impl ReferencePlan {
    /// Sites whose target lies under `root`, in scene walk order
    #[must_use]
    pub fn sites_for(&self, root: NodeId) -> &[ReferenceSite] {
        self.sites.get(&root).map_or(&[], Vec::as_slice)
    }

    /// Total number of sites
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn push(&mut self, root: NodeId, site: ReferenceSite) {
        self.sites.entry(root).or_default().push(site);
        self.len += 1;
    }
}

/// Builds a [`ReferencePlan`] for a selection
#[derive(Debug, Clone)]
pub struct ReferenceScanner<V = StoredFields> {
    structural: HashSet<ComponentKind>,
    visitor: V,
}

impl ReferenceScanner<StoredFields> {
    /// Scanner reading stored reference fields
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_visitor(config, StoredFields)
    }
}

impl<V: ReferenceVisitor> ReferenceScanner<V> {
    /// Scanner using a custom field visitor
    #[must_use]
    pub fn with_visitor(config: &EngineConfig, visitor: V) -> Self {
        Self {
            structural: config.structural_kinds.iter().cloned().collect(),
            visitor,
        }
    }

    /// Collect every reference into the selected subtrees
    ///
    /// Components of structural kinds are skipped. A `(component, path)`
    /// pair is recorded at most once.
    #[must_use]
    pub fn scan(&self, scene: &Scene, lookup: &IdentityLookup) -> ReferencePlan {
        let mut plan = ReferencePlan::default();
        let mut seen: HashSet<(ComponentId, FieldPath)> = HashSet::new();

        for node in scene.walk() {
            let Some(entry) = scene.node(node) else {
                continue;
            };
            for &owner in entry.components() {
                let Some(component) = scene.component(owner) else {
                    continue;
                };
                if self.structural.contains(component.kind()) {
                    continue;
                }

                self.visitor.visit(component, &mut |path, target| {
                    let Some((effective_target, root)) = lookup.resolve(scene, target) else {
                        return;
                    };
                    if !seen.insert((owner, path.clone())) {
                        return;
                    }
                    let kind = match target {
                        ObjectRef::Node(_) => TargetKind::Node,
                        ObjectRef::Component(id) => match scene.component(id) {
                            Some(c) => TargetKind::Component(c.kind().clone()),
                            None => return,
                        },
                    };
                    plan.push(
                        root,
                        ReferenceSite {
                            owner,
                            path: path.clone(),
                            target,
                            effective_target,
                            kind,
                        },
                    );
                });
            }
        }

        tracing::debug!("scanned {} reference sites", plan.len());
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::Selection;
    use pretty_assertions::assert_eq;
    use swap_scene::{Component, FieldValue, NodeSpec};

    struct Fixture {
        scene: Scene,
        root: NodeId,
        child: NodeId,
        image: ComponentId,
        outside: NodeId,
    }

    fn fixture() -> Fixture {
        let mut scene = Scene::new();
        let root = scene.create_node(NodeSpec::new("Root"), None).unwrap();
        let child = scene.create_node(NodeSpec::new("Child"), Some(root)).unwrap();
        let image = scene.add_component(child, "Image").unwrap();
        let outside = scene.create_node(NodeSpec::new("Outside"), None).unwrap();
        Fixture {
            scene,
            root,
            child,
            image,
            outside,
        }
    }

    fn scan(fixture: &Fixture) -> ReferencePlan {
        let lookup =
            IdentityLookup::build(&fixture.scene, &Selection::new([fixture.root]).unwrap())
                .unwrap();
        ReferenceScanner::new(&EngineConfig::default()).scan(&fixture.scene, &lookup)
    }

    #[test]
    fn records_node_and_component_targets() {
        let mut f = fixture();
        let follow = f.scene.add_component(f.outside, "Follow").unwrap();
        f.scene.set_field(follow, "target", FieldValue::node(f.root)).unwrap();
        f.scene.set_field(follow, "icon", FieldValue::component(f.image)).unwrap();

        let plan = scan(&f);
        assert_eq!(plan.len(), 2);
        assert_eq!(
            plan.sites_for(f.root),
            &[
                ReferenceSite {
                    owner: follow,
                    path: "target".into(),
                    target: ObjectRef::Node(f.root),
                    effective_target: f.root,
                    kind: TargetKind::Node,
                },
                ReferenceSite {
                    owner: follow,
                    path: "icon".into(),
                    target: ObjectRef::Component(f.image),
                    effective_target: f.child,
                    kind: TargetKind::Component("Image".into()),
                },
            ]
        );
    }

    #[test]
    fn ignores_outside_and_empty_references() {
        let mut f = fixture();
        let follow = f.scene.add_component(f.root, "Follow").unwrap();
        f.scene.set_field(follow, "other", FieldValue::node(f.outside)).unwrap();
        f.scene.set_field(follow, "none", FieldValue::Reference(None)).unwrap();
        f.scene
            .set_field(follow, "speed", FieldValue::Data(serde_json::json!(2.5)))
            .unwrap();

        assert!(scan(&f).is_empty());
    }

    #[test]
    fn includes_references_from_inside_the_subtree() {
        let mut f = fixture();
        let follow = f.scene.add_component(f.child, "Follow").unwrap();
        f.scene.set_field(follow, "target", FieldValue::node(f.root)).unwrap();

        assert_eq!(scan(&f).sites_for(f.root).len(), 1);
    }

    #[test]
    fn skips_structural_components() {
        let mut f = fixture();
        let transform = f.scene.add_component(f.outside, "Transform").unwrap();
        f.scene.set_field(transform, "parent", FieldValue::node(f.root)).unwrap();

        assert!(scan(&f).is_empty());
    }

    #[test]
    fn deduplicates_repeated_fields() {
        struct Twice;
        impl ReferenceVisitor for Twice {
            fn visit(&self, component: &Component, visit: &mut dyn FnMut(&FieldPath, ObjectRef)) {
                StoredFields.visit(component, visit);
                StoredFields.visit(component, visit);
            }
        }

        let mut f = fixture();
        let follow = f.scene.add_component(f.outside, "Follow").unwrap();
        f.scene.set_field(follow, "target", FieldValue::node(f.root)).unwrap();

        let lookup =
            IdentityLookup::build(&f.scene, &Selection::new([f.root]).unwrap()).unwrap();
        let plan = ReferenceScanner::with_visitor(&EngineConfig::default(), Twice)
            .scan(&f.scene, &lookup);
        assert_eq!(plan.len(), 1);
    }
}
