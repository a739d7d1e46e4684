//! Templates: the source pattern every replacement is instantiated from

use crate::error::SceneError;
use crate::id::NodeId;
use crate::scene::Scene;

/// Creates a new live node in a scene from some source pattern
///
/// The created node is placed as the last top-level node; callers reparent it.
pub trait Instantiate {
    /// Create one instance inside `scene`
    ///
    /// # Errors
    /// Returns a [`SceneError`] if the instance cannot be created
    fn instantiate(&self, scene: &mut Scene) -> Result<NodeId, SceneError>;

    /// Human-readable name for logs
    fn label(&self) -> String;
}

/// Detached subtree held outside the live scene
#[derive(Debug, Clone)]
pub struct Template {
    scene: Scene,
    root: NodeId,
}

impl Template {
    /// Wrap `root` of `scene` as a template
    ///
    /// # Errors
    /// Returns [`SceneError::UnknownNode`] if `root` is not alive in `scene`
    pub fn new(scene: Scene, root: NodeId) -> Result<Self, SceneError> {
        scene.get(root)?;
        Ok(Self { scene, root })
    }

    #[inline]
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Name of the template root
    #[must_use]
    pub fn name(&self) -> &str {
        self.scene.node(self.root).map_or("", |node| node.name())
    }
}

impl Instantiate for Template {
    fn instantiate(&self, scene: &mut Scene) -> Result<NodeId, SceneError> {
        scene.instantiate_from(&self.scene, self.root)
    }

    fn label(&self) -> String {
        self.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeSpec;

    #[test]
    fn rejects_dead_root() {
        let mut scene = Scene::new();
        let root = scene.create_node(NodeSpec::new("T"), None).unwrap();
        scene.destroy(root).unwrap();
        assert_eq!(
            Template::new(scene, root).unwrap_err(),
            SceneError::UnknownNode(root)
        );
    }

    #[test]
    fn instances_are_independent() {
        let mut source = Scene::new();
        let root = source.create_node(NodeSpec::new("T"), None).unwrap();
        source.create_node(NodeSpec::new("Child"), Some(root)).unwrap();
        let template = Template::new(source, root).unwrap();

        let mut scene = Scene::new();
        let first = template.instantiate(&mut scene).unwrap();
        let second = template.instantiate(&mut scene).unwrap();

        assert_ne!(first, second);
        assert_eq!(scene.roots(), &[first, second]);
        assert_eq!(scene.node_count(), 4);
        assert_eq!(template.label(), "T");
    }
}
