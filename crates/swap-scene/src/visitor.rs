//! Reference field discovery
//!
//! The scanner does not know how a component stores its references; it asks
//! a [`ReferenceVisitor`] to enumerate them. [`StoredFields`] reads the
//! component's own field map, which is all the in-memory scene needs.
//! Hosts with other storage (reflection, generated accessors) plug in their
//! own visitor.

use crate::component::{Component, FieldPath, FieldValue, ObjectRef};

/// Enumerates the non-empty reference-typed fields of a component
pub trait ReferenceVisitor {
    /// Call `visit` once per field that currently holds a reference
    fn visit(&self, component: &Component, visit: &mut dyn FnMut(&FieldPath, ObjectRef));
}

/// Visits the reference entries of [`Component::fields`] in declaration order
#[derive(Debug, Clone, Copy, Default)]
pub struct StoredFields;

impl ReferenceVisitor for StoredFields {
    fn visit(&self, component: &Component, visit: &mut dyn FnMut(&FieldPath, ObjectRef)) {
        for (path, value) in component.fields() {
            if let FieldValue::Reference(Some(target)) = value {
                visit(path, *target);
            }
        }
    }
}

impl<V: ReferenceVisitor + ?Sized> ReferenceVisitor for &V {
    fn visit(&self, component: &Component, visit: &mut dyn FnMut(&FieldPath, ObjectRef)) {
        (**self).visit(component, visit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeSpec;
    use crate::scene::Scene;

    #[test]
    fn stored_fields_skips_empty_and_data() {
        let mut scene = Scene::new();
        let node = scene.create_node(NodeSpec::new("A"), None).unwrap();
        let comp = scene.add_component(node, "Follow").unwrap();
        scene.set_field(comp, "empty", FieldValue::Reference(None)).unwrap();
        scene
            .set_field(comp, "speed", FieldValue::Data(serde_json::json!(2.5)))
            .unwrap();
        scene.set_field(comp, "target", FieldValue::node(node)).unwrap();
        scene.set_field(comp, "self", FieldValue::component(comp)).unwrap();

        let mut seen = Vec::new();
        StoredFields.visit(scene.component(comp).unwrap(), &mut |path, target| {
            seen.push((path.to_string(), target));
        });

        assert_eq!(
            seen,
            vec![
                ("target".to_string(), ObjectRef::Node(node)),
                ("self".to_string(), ObjectRef::Component(comp)),
            ]
        );
    }
}
