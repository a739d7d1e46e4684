//! Hierarchy merge: carry the original's state into its replacement
//!
//! Children are matched by exact name, level by level. Matched pairs take
//! the original's active flag; unmatched original children are moved under
//! the replacement so that nothing the user added is lost when the original
//! is destroyed.

use serde::Serialize;
use std::collections::HashMap;
use swap_scene::{Geometry, NodeId, Scene, SceneError};

/// Outcome of merging one original into its replacement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Original descendants matched to a replacement node by name
    pub matched: usize,
    /// Original children moved under the replacement, in move order
    pub adopted: Vec<NodeId>,
    #[serde(skip)]
    correspondence: HashMap<NodeId, NodeId>,
}

impl MergeReport {
    /// Replacement node standing in for `original`
    ///
    /// Defined for the root and every matched descendant. Adopted nodes and
    /// their subtrees have no counterpart; they were moved, not replaced.
    #[inline]
    #[must_use]
    pub fn counterpart(&self, original: NodeId) -> Option<NodeId> {
        self.correspondence.get(&original).copied()
    }
}

/// Copies geometry and state from an original onto its replacement
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchyMerger;

impl HierarchyMerger {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Copy placement from `original` to `replacement`
    ///
    /// Rect to rect copies anchored position, size delta and scale; anchors
    /// and pivot stay as the template defines them. Any other pairing copies
    /// world position, rotation and scale.
    ///
    /// # Errors
    /// Returns [`SceneError::UnknownNode`] if either node is dead
    pub fn copy_geometry(
        &self,
        scene: &mut Scene,
        original: NodeId,
        replacement: NodeId,
    ) -> Result<(), SceneError> {
        let source = *scene.get(original)?.geometry();
        let mut target = *scene.get(replacement)?.geometry();

        match (&source, &mut target) {
            (Geometry::Rect(from), Geometry::Rect(to)) => {
                to.anchored_position = from.anchored_position;
                to.size_delta = from.size_delta;
                to.scale = from.scale;
            }
            _ => target.set_world(
                source.world_position(),
                source.world_rotation(),
                source.scale(),
            ),
        }

        scene.set_geometry(replacement, target)
    }

    /// Merge `original` into `replacement`
    ///
    /// First copies active flags across the name-matched hierarchy (the root
    /// pair included), then adopts unmatched original children.
    ///
    /// # Errors
    /// Propagates [`SceneError`] from the scene primitives
    pub fn merge(
        &self,
        scene: &mut Scene,
        original: NodeId,
        replacement: NodeId,
    ) -> Result<MergeReport, SceneError> {
        let mut report = MergeReport::default();
        report.correspondence.insert(original, replacement);

        self.copy_states(scene, original, replacement)?;
        self.adopt_children(scene, original, replacement, &mut report)?;

        tracing::debug!(
            "merged {} into {}: {} matched, {} adopted",
            original,
            replacement,
            report.matched,
            report.adopted.len()
        );
        Ok(report)
    }

    fn copy_states(
        &self,
        scene: &mut Scene,
        original: NodeId,
        copy: NodeId,
    ) -> Result<(), SceneError> {
        let active = scene.get(original)?.is_active();
        scene.set_active(copy, active)?;

        let children = scene.children(copy)?.to_vec();
        for child in children {
            let counterpart = {
                let name = scene.get(child)?.name();
                scene.child_named(original, name)?
            };
            if let Some(counterpart) = counterpart {
                self.copy_states(scene, counterpart, child)?;
            }
        }
        Ok(())
    }

    fn adopt_children(
        &self,
        scene: &mut Scene,
        original: NodeId,
        copy: NodeId,
        report: &mut MergeReport,
    ) -> Result<(), SceneError> {
        // Snapshot before adopting so moved nodes are never matched against.
        let copy_children = scene.children(copy)?.to_vec();
        let original_children = scene.children(original)?.to_vec();

        for child in original_children {
            let counterpart = {
                let name = scene.get(child)?.name();
                copy_children
                    .iter()
                    .copied()
                    .find(|&c| scene.node(c).is_some_and(|node| node.name() == name))
            };

            match counterpart {
                Some(counterpart) => {
                    report.matched += 1;
                    report.correspondence.entry(child).or_insert(counterpart);
                    self.adopt_children(scene, child, counterpart, report)?;
                }
                None => {
                    scene.set_parent(child, Some(copy))?;
                    tracing::trace!("adopted {} under {}", child, copy);
                    report.adopted.push(child);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use swap_scene::{NodeSpec, Quat, RectGeometry, Vec2, Vec3, WorldGeometry};

    fn names(scene: &Scene, parent: NodeId) -> Vec<String> {
        scene
            .children(parent)
            .unwrap()
            .iter()
            .map(|&c| scene.get(c).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn rect_to_rect_keeps_template_anchors() {
        let mut scene = Scene::new();
        let from = RectGeometry {
            anchored_position: Vec2::new(10.0, 20.0),
            size_delta: Vec2::new(100.0, 50.0),
            scale: Vec3::new(2.0, 2.0, 1.0),
            anchor_min: Vec2::new(0.0, 0.0),
            ..RectGeometry::default()
        };
        let to = RectGeometry {
            anchor_min: Vec2::new(0.5, 0.5),
            pivot: Vec2::new(0.0, 1.0),
            ..RectGeometry::default()
        };
        let original = scene
            .create_node(NodeSpec::new("A").with_geometry(Geometry::Rect(from)), None)
            .unwrap();
        let replacement = scene
            .create_node(NodeSpec::new("T").with_geometry(Geometry::Rect(to)), None)
            .unwrap();

        HierarchyMerger::new()
            .copy_geometry(&mut scene, original, replacement)
            .unwrap();

        let Geometry::Rect(result) = *scene.get(replacement).unwrap().geometry() else {
            panic!("replacement lost its rect geometry");
        };
        assert_eq!(result.anchored_position, from.anchored_position);
        assert_eq!(result.size_delta, from.size_delta);
        assert_eq!(result.scale, from.scale);
        assert_eq!(result.anchor_min, Vec2::new(0.5, 0.5));
        assert_eq!(result.pivot, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn world_copies_position_rotation_scale() {
        let mut scene = Scene::new();
        let from = WorldGeometry {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::new(0.0, 0.7071, 0.0, 0.7071),
            scale: Vec3::new(2.0, 2.0, 2.0),
        };
        let original = scene
            .create_node(NodeSpec::new("A").with_geometry(Geometry::World(from)), None)
            .unwrap();
        let replacement = scene.create_node(NodeSpec::new("T"), None).unwrap();

        HierarchyMerger::new()
            .copy_geometry(&mut scene, original, replacement)
            .unwrap();

        assert_eq!(*scene.get(replacement).unwrap().geometry(), Geometry::World(from));
    }

    #[test]
    fn copies_active_flags_through_matched_names() {
        let mut scene = Scene::new();
        let original = scene
            .create_node(NodeSpec::new("A").with_active(false), None)
            .unwrap();
        let a_icon = scene
            .create_node(NodeSpec::new("Icon"), Some(original))
            .unwrap();
        scene
            .create_node(NodeSpec::new("Glow").with_active(false), Some(a_icon))
            .unwrap();

        let copy = scene.create_node(NodeSpec::new("T"), None).unwrap();
        let t_icon = scene.create_node(NodeSpec::new("Icon"), Some(copy)).unwrap();
        let t_glow = scene.create_node(NodeSpec::new("Glow"), Some(t_icon)).unwrap();
        let t_label = scene.create_node(NodeSpec::new("Label"), Some(copy)).unwrap();

        let report = HierarchyMerger::new()
            .merge(&mut scene, original, copy)
            .unwrap();

        assert!(!scene.get(copy).unwrap().is_active());
        assert!(scene.get(t_icon).unwrap().is_active());
        assert!(!scene.get(t_glow).unwrap().is_active());
        assert!(scene.get(t_label).unwrap().is_active());
        assert_eq!(report.matched, 2);
        assert!(report.adopted.is_empty());
        assert_eq!(report.counterpart(a_icon), Some(t_icon));
    }

    #[test]
    fn adopts_unmatched_children_recursively() {
        let mut scene = Scene::new();
        let original = scene.create_node(NodeSpec::new("A"), None).unwrap();
        let a_icon = scene
            .create_node(NodeSpec::new("Icon"), Some(original))
            .unwrap();
        let badge = scene.create_node(NodeSpec::new("Badge"), Some(a_icon)).unwrap();
        let extra = scene.create_node(NodeSpec::new("Extra"), Some(original)).unwrap();

        let copy = scene.create_node(NodeSpec::new("T"), None).unwrap();
        let t_icon = scene.create_node(NodeSpec::new("Icon"), Some(copy)).unwrap();
        scene.create_node(NodeSpec::new("Label"), Some(copy)).unwrap();

        let report = HierarchyMerger::new()
            .merge(&mut scene, original, copy)
            .unwrap();

        assert_eq!(report.adopted, vec![badge, extra]);
        assert_eq!(names(&scene, copy), vec!["Icon", "Label", "Extra"]);
        assert_eq!(names(&scene, t_icon), vec!["Badge"]);
        assert_eq!(scene.parent(extra).unwrap(), Some(copy));
        assert!(scene.children(original).unwrap() == [a_icon]);
        assert_eq!(report.counterpart(extra), None);
    }

    #[test]
    fn duplicate_names_match_first_and_never_adopted_nodes() {
        let mut scene = Scene::new();
        let original = scene.create_node(NodeSpec::new("A"), None).unwrap();
        let first = scene.create_node(NodeSpec::new("Item"), Some(original)).unwrap();
        let second = scene.create_node(NodeSpec::new("Item"), Some(original)).unwrap();
        let moved = scene.create_node(NodeSpec::new("Moved"), Some(original)).unwrap();
        scene.create_node(NodeSpec::new("Moved"), Some(original)).unwrap();

        let copy = scene.create_node(NodeSpec::new("T"), None).unwrap();
        let t_item = scene.create_node(NodeSpec::new("Item"), Some(copy)).unwrap();

        let report = HierarchyMerger::new()
            .merge(&mut scene, original, copy)
            .unwrap();

        // Both "Item"s map to the single template "Item"; both "Moved"s are
        // adopted because the first adoption is not part of the snapshot.
        assert_eq!(report.matched, 2);
        assert_eq!(report.counterpart(first), Some(t_item));
        assert_eq!(report.counterpart(second), Some(t_item));
        assert_eq!(report.adopted.len(), 2);
        assert_eq!(report.adopted[0], moved);
        assert_eq!(names(&scene, copy), vec!["Item", "Moved", "Moved"]);
    }
}
