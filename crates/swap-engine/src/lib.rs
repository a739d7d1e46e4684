//! Swap Engine
//!
//! Replaces selected nodes of a [`Scene`](swap_scene::Scene) with fresh
//! instances of a template, keeping what the user built around them.
//!
//! # Core Concepts
//!
//! - [`Selection`]: ordered roots to replace
//! - [`IdentityLookup`]: node to selected-root map, built before mutation
//! - [`ReferenceScanner`]: captures every reference into the selection
//! - [`HierarchyMerger`]: copies geometry and active flags, adopts extra children
//! - [`ReferenceRemapper`]: points captured references at the replacement
//! - [`ReplacementTransaction`]: runs it all inside one undo group
//!
//! # Example
//!
//! ```rust
//! use swap_engine::{ReplacementTransaction, Selection};
//! use swap_scene::{FieldValue, NodeSpec, ObjectRef, Scene, Template};
//!
//! let mut library = Scene::new();
//! let button = library.create_node(NodeSpec::new("Button"), None).unwrap();
//! let template = Template::new(library, button).unwrap();
//!
//! let mut scene = Scene::new();
//! let old = scene.create_node(NodeSpec::new("Play"), None).unwrap();
//! let camera = scene.create_node(NodeSpec::new("Camera"), None).unwrap();
//! let follow = scene.add_component(camera, "Follow").unwrap();
//! scene.set_field(follow, "target", FieldValue::node(old)).unwrap();
//!
//! let report = ReplacementTransaction::default()
//!     .run(&mut scene, &Selection::new([old]).unwrap(), Some(&template))
//!     .unwrap();
//!
//! let new = report.replacements[0].replacement;
//! assert_eq!(scene.get(new).unwrap().name(), "Play");
//! assert_eq!(
//!     scene.component(follow).unwrap().field(&"target".into()).unwrap().target(),
//!     Some(ObjectRef::Node(new))
//! );
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod config;
mod error;
mod lookup;
mod merger;
mod remapper;
mod scanner;
mod selection;
mod transaction;

// Re-exports
pub use config::EngineConfig;
pub use error::{ConfigError, LookupError, ResolutionFailure, SelectionError, TransactionError};
pub use lookup::IdentityLookup;
pub use merger::{HierarchyMerger, MergeReport};
pub use remapper::{ReferenceRemapper, RemapReport};
pub use scanner::{ReferencePlan, ReferenceScanner, ReferenceSite, TargetKind};
pub use selection::Selection;
pub use transaction::{Replacement, ReplacementReport, ReplacementTransaction};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
