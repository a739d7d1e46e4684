//! Scene documents
//!
//! Serializable form of a scene. Objects carry document keys instead of
//! handles; reference fields are written as `{ "ref": "<key>" }` (or
//! `{ "ref": null }` when empty) and every other field value is opaque data.
//!
//! ```
//! use swap_scene::SceneDocument;
//!
//! let doc = SceneDocument::from_json_str(r#"{
//!     "nodes": [
//!         { "key": "a", "name": "A", "components": [
//!             { "key": "a.follow", "kind": "Follow", "fields": { "target": { "ref": "b" } } }
//!         ] },
//!         { "key": "b", "name": "B" }
//!     ]
//! }"#).unwrap();
//!
//! let (scene, keys) = doc.to_scene().unwrap();
//! assert_eq!(scene.node_count(), 2);
//! assert!(keys.contains_key("a.follow"));
//! ```

use crate::component::{ComponentKind, FieldValue, ObjectRef};
use crate::error::DocumentError;
use crate::geometry::Geometry;
use crate::id::{ComponentId, NodeId};
use crate::node::NodeSpec;
use crate::scene::Scene;
use crate::template::Template;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Document key → live object
pub type KeyMap = HashMap<String, ObjectRef>;

/// Whole scene, top-level nodes in order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default)]
    pub nodes: Vec<NodeDocument>,
}

/// One node and its subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    pub key: String,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub geometry: Geometry,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ComponentDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDocument>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDocument {
    pub key: String,
    pub kind: ComponentKind,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, FieldDocument>,
}

/// Field value as written in a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum FieldDocument {
    /// Reference by document key
    Reference(Option<String>),
    /// Opaque value
    Data(serde_json::Value),
}

impl From<serde_json::Value> for FieldDocument {
    fn from(value: serde_json::Value) -> Self {
        if let serde_json::Value::Object(map) = &value {
            if map.len() == 1 {
                match map.get("ref") {
                    Some(serde_json::Value::Null) => return Self::Reference(None),
                    Some(serde_json::Value::String(key)) => return Self::Reference(Some(key.clone())),
                    _ => {}
                }
            }
        }
        Self::Data(value)
    }
}

impl From<FieldDocument> for serde_json::Value {
    fn from(field: FieldDocument) -> Self {
        match field {
            FieldDocument::Reference(key) => serde_json::json!({ "ref": key }),
            FieldDocument::Data(value) => value,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Result<Self, DocumentError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            _ => Err(DocumentError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

impl SceneDocument {
    /// Parse a JSON document
    ///
    /// # Errors
    /// Returns [`DocumentError::Json`] on malformed input
    pub fn from_json_str(text: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse a YAML document
    ///
    /// # Errors
    /// Returns [`DocumentError::Yaml`] on malformed input
    pub fn from_yaml_str(text: &str) -> Result<Self, DocumentError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Read a `.json`, `.yaml` or `.yml` file
    ///
    /// # Errors
    /// Returns [`DocumentError`] on IO failure, unknown extension or malformed input
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let format = Format::of(path)?;
        let text = fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match format {
            Format::Json => Self::from_json_str(&text),
            Format::Yaml => Self::from_yaml_str(&text),
        }
    }

    /// Write to a `.json`, `.yaml` or `.yml` file
    ///
    /// # Errors
    /// Returns [`DocumentError`] on IO failure or unknown extension
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        let text = match Format::of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Yaml => serde_yaml::to_string(self)?,
        };
        fs::write(path, text).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Build a live scene, returning it with the key of every object
    ///
    /// # Errors
    /// - [`DocumentError::DuplicateKey`] if two objects share a key
    /// - [`DocumentError::UnknownKey`] if a reference names a missing key
    pub fn to_scene(&self) -> Result<(Scene, KeyMap), DocumentError> {
        let mut scene = Scene::new();
        let mut keys = KeyMap::new();
        let mut pending = Vec::new();
        for node in &self.nodes {
            build_node(&mut scene, &mut keys, &mut pending, node, None)?;
        }

        for (id, doc) in pending {
            for (path, field) in &doc.fields {
                let value = match field {
                    FieldDocument::Reference(None) => FieldValue::Reference(None),
                    FieldDocument::Reference(Some(key)) => {
                        let target = keys.get(key).ok_or_else(|| DocumentError::UnknownKey {
                            field: format!("{}.{}", doc.key, path),
                            key: key.clone(),
                        })?;
                        FieldValue::Reference(Some(*target))
                    }
                    FieldDocument::Data(value) => FieldValue::Data(value.clone()),
                };
                scene.set_field(id, path.as_str(), value)?;
            }
        }

        Ok((scene, keys))
    }

    /// Build a template rooted at `root_key`, or at the first top-level node
    ///
    /// # Errors
    /// Returns [`DocumentError::MissingRoot`] if the root cannot be found,
    /// or any error of [`SceneDocument::to_scene`]
    pub fn to_template(&self, root_key: Option<&str>) -> Result<Template, DocumentError> {
        let (scene, keys) = self.to_scene()?;
        let root = match root_key {
            Some(key) => match keys.get(key) {
                Some(ObjectRef::Node(id)) => *id,
                _ => return Err(DocumentError::MissingRoot(key.to_string())),
            },
            None => *scene
                .roots()
                .first()
                .ok_or_else(|| DocumentError::MissingRoot("<first>".to_string()))?,
        };
        Ok(Template::new(scene, root)?)
    }

    /// Describe a live scene
    ///
    /// Objects found in `keys` keep their key; others are keyed by handle,
    /// made distinct from every key in `keys`.
    /// References to destroyed objects are written as empty references.
    #[must_use]
    pub fn from_scene(scene: &Scene, keys: Option<&KeyMap>) -> Self {
        let names: HashMap<ObjectRef, &str> = keys
            .map(|keys| keys.iter().map(|(key, target)| (*target, key.as_str())).collect())
            .unwrap_or_default();
        let taken = names.values().copied().collect();
        let writer = Writer {
            scene,
            names,
            taken,
        };
        Self {
            nodes: scene
                .roots()
                .iter()
                .filter_map(|&root| writer.node(root))
                .collect(),
        }
    }

    /// Serialize as pretty JSON
    ///
    /// # Errors
    /// Returns [`DocumentError::Json`] if serialization fails
    pub fn to_json_string(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn insert_key(keys: &mut KeyMap, key: &str, target: ObjectRef) -> Result<(), DocumentError> {
    if keys.insert(key.to_string(), target).is_some() {
        return Err(DocumentError::DuplicateKey(key.to_string()));
    }
    Ok(())
}

fn build_node<'d>(
    scene: &mut Scene,
    keys: &mut KeyMap,
    pending: &mut Vec<(ComponentId, &'d ComponentDocument)>,
    doc: &'d NodeDocument,
    parent: Option<NodeId>,
) -> Result<(), DocumentError> {
    let spec = NodeSpec::new(doc.name.clone())
        .with_active(doc.active)
        .with_geometry(doc.geometry);
    let id = scene.create_node(spec, parent)?;
    insert_key(keys, &doc.key, ObjectRef::Node(id))?;

    for component in &doc.components {
        let component_id = scene.add_component(id, component.kind.clone())?;
        insert_key(keys, &component.key, ObjectRef::Component(component_id))?;
        pending.push((component_id, component));
    }
    for child in &doc.children {
        build_node(scene, keys, pending, child, Some(id))?;
    }
    Ok(())
}

struct Writer<'s> {
    scene: &'s Scene,
    names: HashMap<ObjectRef, &'s str>,
    taken: HashSet<&'s str>,
}

impl Writer<'_> {
    /// Document key of `target`; unkeyed objects get their handle, suffixed
    /// with `~` until it clashes with no existing key
    fn key(&self, target: ObjectRef) -> String {
        if let Some(key) = self.names.get(&target) {
            return (*key).to_string();
        }
        let mut key = target.to_string();
        while self.taken.contains(key.as_str()) {
            key.push('~');
        }
        key
    }

    fn alive(&self, target: ObjectRef) -> bool {
        match target {
            ObjectRef::Node(id) => self.scene.contains(id),
            ObjectRef::Component(id) => self.scene.contains_component(id),
        }
    }

    fn node(&self, id: NodeId) -> Option<NodeDocument> {
        let node = self.scene.node(id)?;
        let components = node
            .components()
            .iter()
            .filter_map(|&component_id| {
                let component = self.scene.component(component_id)?;
                let fields = component
                    .fields()
                    .map(|(path, value)| (path.to_string(), self.field(value)))
                    .collect();
                Some(ComponentDocument {
                    key: self.key(ObjectRef::Component(component_id)),
                    kind: component.kind().clone(),
                    fields,
                })
            })
            .collect();

        Some(NodeDocument {
            key: self.key(ObjectRef::Node(id)),
            name: node.name().to_string(),
            active: node.is_active(),
            geometry: *node.geometry(),
            components,
            children: node
                .children()
                .iter()
                .filter_map(|&child| self.node(child))
                .collect(),
        })
    }

    fn field(&self, value: &FieldValue) -> FieldDocument {
        match value {
            FieldValue::Reference(Some(target)) if self.alive(*target) => {
                FieldDocument::Reference(Some(self.key(*target)))
            }
            FieldValue::Reference(Some(target)) => {
                tracing::warn!("writing dangling reference to {} as empty", self.key(*target));
                FieldDocument::Reference(None)
            }
            FieldValue::Reference(None) => FieldDocument::Reference(None),
            FieldValue::Data(value) => FieldDocument::Data(value.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
nodes:
  - key: canvas
    name: Canvas
    geometry: { kind: rect }
    children:
      - key: button
        name: Button
        active: false
        components:
          - key: button.click
            kind: Click
            fields:
              target: { ref: canvas }
              label: { ref: null }
              speed: 3
              color: { r: 1, g: 0, b: 0 }
"#;

    #[test]
    fn yaml_loads_references_and_data() {
        let doc = SceneDocument::from_yaml_str(SAMPLE).unwrap();
        let (scene, keys) = doc.to_scene().unwrap();

        let Some(ObjectRef::Node(button)) = keys.get("button").copied() else {
            panic!("button key missing");
        };
        let Some(ObjectRef::Node(canvas)) = keys.get("canvas").copied() else {
            panic!("canvas key missing");
        };
        assert!(!scene.get(button).unwrap().is_active());
        assert!(scene.get(canvas).unwrap().geometry().is_rect());

        let click = scene
            .component_of_kind(button, &ComponentKind::new("Click"))
            .unwrap();
        let component = scene.component(click).unwrap();
        assert_eq!(component.field(&"target".into()), Some(&FieldValue::node(canvas)));
        assert_eq!(component.field(&"label".into()), Some(&FieldValue::Reference(None)));
        assert_eq!(
            component.field(&"color".into()),
            Some(&FieldValue::Data(serde_json::json!({ "r": 1, "g": 0, "b": 0 })))
        );
    }

    #[test]
    fn from_scene_preserves_keys() {
        let doc = SceneDocument::from_yaml_str(SAMPLE).unwrap();
        let (scene, keys) = doc.to_scene().unwrap();
        let written = SceneDocument::from_scene(&scene, Some(&keys));
        assert_eq!(written, doc);
    }

    #[test]
    fn duplicate_key_rejected() {
        let doc = SceneDocument::from_json_str(
            r#"{ "nodes": [ { "key": "a", "name": "A" }, { "key": "a", "name": "B" } ] }"#,
        )
        .unwrap();
        assert!(matches!(doc.to_scene(), Err(DocumentError::DuplicateKey(key)) if key == "a"));
    }

    #[test]
    fn unknown_reference_rejected() {
        let doc = SceneDocument::from_json_str(
            r#"{ "nodes": [ { "key": "a", "name": "A", "components": [
                { "key": "c", "kind": "Follow", "fields": { "target": { "ref": "ghost" } } }
            ] } ] }"#,
        )
        .unwrap();
        let err = doc.to_scene().unwrap_err();
        assert!(matches!(
            err,
            DocumentError::UnknownKey { ref field, ref key } if field == "c.target" && key == "ghost"
        ));
    }

    #[test]
    fn dangling_reference_written_empty() {
        let mut scene = Scene::new();
        let a = scene.create_node(NodeSpec::new("A"), None).unwrap();
        let b = scene.create_node(NodeSpec::new("B"), None).unwrap();
        let follow = scene.add_component(a, "Follow").unwrap();
        scene.set_field(follow, "target", FieldValue::node(b)).unwrap();
        scene.destroy(b).unwrap();

        let doc = SceneDocument::from_scene(&scene, None);
        assert_eq!(
            doc.nodes[0].components[0].fields["target"],
            FieldDocument::Reference(None)
        );
        assert_eq!(doc.nodes[0].key, a.to_string());
    }

    #[test]
    fn fallback_keys_avoid_existing_keys() {
        let mut scene = Scene::new();
        let a = scene.create_node(NodeSpec::new("A"), None).unwrap();
        let b = scene.create_node(NodeSpec::new("B"), None).unwrap();
        let follow = scene.add_component(a, "Follow").unwrap();
        scene.set_field(follow, "target", FieldValue::node(b)).unwrap();

        // A carries the key that B's handle would fall back to
        let mut keys = KeyMap::new();
        keys.insert(b.to_string(), ObjectRef::Node(a));

        let doc = SceneDocument::from_scene(&scene, Some(&keys));
        let b_key = format!("{b}~");
        assert_eq!(doc.nodes[0].key, b.to_string());
        assert_eq!(doc.nodes[1].key, b_key);
        assert_eq!(
            doc.nodes[0].components[0].fields["target"],
            FieldDocument::Reference(Some(b_key.clone()))
        );

        let (reloaded, reloaded_keys) = doc.to_scene().unwrap();
        assert_eq!(reloaded.node_count(), 2);
        let Some(ObjectRef::Node(reloaded_b)) = reloaded_keys.get(&b_key).copied() else {
            panic!("{b_key} missing after reload");
        };
        assert_eq!(reloaded.get(reloaded_b).unwrap().name(), "B");
    }

    #[test]
    fn template_root_by_key() {
        let doc = SceneDocument::from_yaml_str(SAMPLE).unwrap();
        let template = doc.to_template(Some("button")).unwrap();
        assert_eq!(template.name(), "Button");

        let template = doc.to_template(None).unwrap();
        assert_eq!(template.name(), "Canvas");

        assert!(matches!(
            doc.to_template(Some("button.click")),
            Err(DocumentError::MissingRoot(_))
        ));
    }

    #[test]
    fn unsupported_extension() {
        let err = SceneDocument::load(Path::new("scene.txt")).unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedFormat(_)));
    }
}
