//! Testing utilities for the swap workspace
//!
//! Shared scene builders, fixtures, and assertions.

#![allow(missing_docs)]

use std::cell::Cell;
use swap_scene::{
    ComponentId, FieldValue, Geometry, Instantiate, NodeId, NodeSpec, RectGeometry, Scene,
    SceneDocument, SceneError, Template, Vec2, Vec3,
};

/// Template `Button { Image } / Foo`
pub fn button_template() -> Template {
    let mut scene = Scene::new();
    let root = scene
        .create_node(
            NodeSpec::new("Button").with_geometry(Geometry::Rect(RectGeometry::default())),
            None,
        )
        .unwrap();
    scene.add_component(root, "Image").unwrap();
    scene.create_node(NodeSpec::new("Foo"), Some(root)).unwrap();
    Template::new(scene, root).unwrap()
}

/// The worked example: one selected root, an outside reference to it
///
/// ```text
/// Canvas
/// ├── Before
/// ├── A { Image }          rect at (10, 20)
/// │   ├── Foo  (inactive)
/// │   └── Bar
/// │       └── Baz
/// └── After
/// Z { Follow: target -> A, graphic -> A.Image }
/// ```
pub struct Example {
    pub scene: Scene,
    pub canvas: NodeId,
    pub a: NodeId,
    pub a_image: ComponentId,
    pub foo: NodeId,
    pub bar: NodeId,
    pub baz: NodeId,
    pub z: NodeId,
    pub follow: ComponentId,
    pub template: Template,
}

pub fn example() -> Example {
    let mut scene = Scene::new();
    let canvas = scene.create_node(NodeSpec::new("Canvas"), None).unwrap();
    scene.create_node(NodeSpec::new("Before"), Some(canvas)).unwrap();

    let rect = RectGeometry {
        anchored_position: Vec2::new(10.0, 20.0),
        size_delta: Vec2::new(160.0, 30.0),
        scale: Vec3::new(1.5, 1.5, 1.0),
        ..RectGeometry::default()
    };
    let a = scene
        .create_node(
            NodeSpec::new("A").with_geometry(Geometry::Rect(rect)),
            Some(canvas),
        )
        .unwrap();
    let a_image = scene.add_component(a, "Image").unwrap();
    let foo = scene
        .create_node(NodeSpec::new("Foo").with_active(false), Some(a))
        .unwrap();
    let bar = scene.create_node(NodeSpec::new("Bar"), Some(a)).unwrap();
    let baz = scene.create_node(NodeSpec::new("Baz"), Some(bar)).unwrap();
    scene.create_node(NodeSpec::new("After"), Some(canvas)).unwrap();

    let z = scene.create_node(NodeSpec::new("Z"), None).unwrap();
    let follow = scene.add_component(z, "Follow").unwrap();
    scene.set_field(follow, "target", FieldValue::node(a)).unwrap();
    scene
        .set_field(follow, "graphic", FieldValue::component(a_image))
        .unwrap();

    Example {
        scene,
        canvas,
        a,
        a_image,
        foo,
        bar,
        baz,
        z,
        follow,
        template: button_template(),
    }
}

/// Instantiates normally until call number `fail_on` (zero-based), which
/// creates the instance, then loses it and fails
#[derive(Debug)]
pub struct FailingTemplate {
    inner: Template,
    fail_on: usize,
    calls: Cell<usize>,
}

impl FailingTemplate {
    pub fn new(inner: Template, fail_on: usize) -> Self {
        Self {
            inner,
            fail_on,
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Instantiate for FailingTemplate {
    fn instantiate(&self, scene: &mut Scene) -> Result<NodeId, SceneError> {
        let call = self.calls.get();
        self.calls.set(call + 1);

        let id = self.inner.instantiate(scene)?;
        if call == self.fail_on {
            scene.destroy(id)?;
            return Err(SceneError::UnknownNode(id));
        }
        Ok(id)
    }

    fn label(&self) -> String {
        format!("failing {}", self.inner.label())
    }
}

/// Handle-exact description of a scene, for before/after comparisons
pub fn snapshot(scene: &Scene) -> SceneDocument {
    SceneDocument::from_scene(scene, None)
}

/// Names of the children of `parent`, in order
pub fn child_names(scene: &Scene, parent: NodeId) -> Vec<String> {
    scene
        .children(parent)
        .unwrap()
        .iter()
        .map(|&child| scene.get(child).unwrap().name().to_string())
        .collect()
}

/// First child of `parent` named `name`; panics if missing
pub fn child(scene: &Scene, parent: NodeId, name: &str) -> NodeId {
    scene
        .child_named(parent, name)
        .unwrap()
        .unwrap_or_else(|| panic!("{} has no child named {name}", parent))
}
