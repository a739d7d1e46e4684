//! `swap inspect`

use anyhow::Context;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;
use swap_scene::{NodeId, ObjectRef, ReferenceVisitor, Scene, SceneDocument, StoredFields};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeEntry {
    pub key: String,
    pub path: String,
    pub depth: usize,
    pub active: bool,
    pub components: Vec<String>,
}

/// A reference field and where it points
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceEntry {
    /// Key of the component holding the field
    pub owner: String,
    pub kind: String,
    pub field: String,
    pub target: String,
    pub target_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InspectReport {
    pub nodes: Vec<NodeEntry>,
    pub references: Vec<ReferenceEntry>,
}

impl InspectReport {
    #[must_use]
    pub fn render(&self) -> String {
        let mut text = String::new();
        for node in &self.nodes {
            let _ = write!(text, "{}{} [{}]", "  ".repeat(node.depth), node.path, node.key);
            if !node.active {
                text.push_str(" (inactive)");
            }
            if !node.components.is_empty() {
                let _ = write!(text, " {{{}}}", node.components.join(", "));
            }
            text.push('\n');
        }
        if !self.references.is_empty() {
            text.push_str("references:\n");
            for reference in &self.references {
                let _ = writeln!(
                    text,
                    "  {} {}.{} -> {} [{}]",
                    reference.owner,
                    reference.kind,
                    reference.field,
                    reference.target_path,
                    reference.target
                );
            }
        }
        text
    }
}

/// Describe the hierarchy and references of a scene document
///
/// # Errors
/// Fails if the document cannot be loaded
pub fn inspect(path: &Path) -> anyhow::Result<InspectReport> {
    let (scene, keys) = SceneDocument::load(path)
        .and_then(|document| document.to_scene())
        .with_context(|| format!("cannot load scene {}", path.display()))?;
    let names: HashMap<ObjectRef, &str> = keys
        .iter()
        .map(|(key, target)| (*target, key.as_str()))
        .collect();
    let key_of = |target: ObjectRef| {
        names
            .get(&target)
            .map_or_else(|| target.to_string(), |key| (*key).to_string())
    };

    let mut report = InspectReport::default();
    for id in scene.walk() {
        let node = scene.get(id)?;
        report.nodes.push(NodeEntry {
            key: key_of(ObjectRef::Node(id)),
            path: scene.path_of(id)?,
            depth: depth(&scene, id),
            active: node.is_active(),
            components: node
                .components()
                .iter()
                .filter_map(|&c| scene.component(c))
                .map(|c| c.kind().to_string())
                .collect(),
        });

        for &component_id in node.components() {
            let Some(component) = scene.component(component_id) else {
                continue;
            };
            StoredFields.visit(component, &mut |field, target| {
                let target_path = scene
                    .owner_of(target)
                    .and_then(|owner| scene.path_of(owner).ok())
                    .unwrap_or_default();
                report.references.push(ReferenceEntry {
                    owner: key_of(ObjectRef::Component(component_id)),
                    kind: component.kind().to_string(),
                    field: field.to_string(),
                    target: key_of(target),
                    target_path,
                });
            });
        }
    }
    Ok(report)
}

fn depth(scene: &Scene, id: NodeId) -> usize {
    let mut depth = 0;
    let mut current = scene.parent(id).ok().flatten();
    while let Some(parent) = current {
        depth += 1;
        current = scene.parent(parent).ok().flatten();
    }
    depth
}
