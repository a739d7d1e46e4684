//! Error types for scene operations

use crate::id::{ComponentId, NodeId};
use std::path::PathBuf;

/// Errors raised by scene primitives and the mutation journal
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// Node handle is dead or was never issued by this scene
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// Component handle is dead or was never issued by this scene
    #[error("unknown component {0}")]
    UnknownComponent(ComponentId),

    /// Reparenting would make a node its own ancestor
    #[error("cannot parent {node} under {parent}: would create a cycle")]
    WouldCreateCycle { node: NodeId, parent: NodeId },

    /// A journal group is already recording
    #[error("undo group '{0}' is already open")]
    GroupAlreadyOpen(String),

    /// Commit or rollback without an open group
    #[error("no undo group is open")]
    NoOpenGroup,

    /// Undo group no longer matches the scene
    #[error("undo group '{label}' is stale: {reason}")]
    StaleUndoGroup { label: String, reason: String },
}

/// Errors while loading or saving scene documents
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// JSON (de)serialization failed
    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML (de)serialization failed
    #[error("invalid YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File access failed
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File extension is not .json, .yaml or .yml
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Two objects share a key
    #[error("duplicate key '{0}'")]
    DuplicateKey(String),

    /// A reference names a key that does not exist
    #[error("field '{field}' references unknown key '{key}'")]
    UnknownKey { field: String, key: String },

    /// Named template root is missing
    #[error("template root '{0}' not found")]
    MissingRoot(String),

    /// Scene rejected the document structure
    #[error(transparent)]
    Scene(#[from] SceneError),
}
