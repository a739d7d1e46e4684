//! Swap Scene
//!
//! The live object hierarchy that replacements operate on.
//!
//! # Core Concepts
//!
//! - [`Scene`]: node and component arenas addressed by generation-checked
//!   handles ([`NodeId`], [`ComponentId`])
//! - [`Geometry`]: anchored-rect or world-space geometry of a node
//! - [`Component`]: typed field bundle; reference fields hold [`ObjectRef`]s
//! - [`ReferenceVisitor`]: enumerates the reference fields of a component
//! - [`UndoGroup`]: journaled mutations that can be rolled back or undone
//! - [`Template`]: detached subtree that new nodes are instantiated from
//! - [`SceneDocument`]: JSON/YAML form of a scene
//!
//! # Example
//!
//! ```rust
//! use swap_scene::{FieldValue, NodeSpec, Scene};
//!
//! let mut scene = Scene::new();
//! let panel = scene.create_node(NodeSpec::new("Panel"), None).unwrap();
//! let follow = scene.add_component(panel, "Follow").unwrap();
//!
//! scene.begin_group("retarget").unwrap();
//! scene.set_field(follow, "target", FieldValue::node(panel)).unwrap();
//! scene.rollback_group().unwrap();
//!
//! assert!(scene.component(follow).unwrap().field(&"target".into()).is_none());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod component;
mod document;
mod error;
mod geometry;
mod id;
mod journal;
mod node;
mod scene;
mod template;
mod visitor;

// Re-exports
pub use component::{Component, ComponentKind, FieldPath, FieldValue, ObjectRef};
pub use document::{ComponentDocument, FieldDocument, KeyMap, NodeDocument, SceneDocument};
pub use error::{DocumentError, SceneError};
pub use geometry::{Geometry, Quat, RectGeometry, Vec2, Vec3, WorldGeometry};
pub use id::{ComponentId, NodeId};
pub use journal::UndoGroup;
pub use node::{Node, NodeSpec};
pub use scene::Scene;
pub use template::{Instantiate, Template};
pub use visitor::{ReferenceVisitor, StoredFields};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
