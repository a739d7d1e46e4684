//! Error types for the replacement engine
//!
//! Two tiers:
//! - [`ResolutionFailure`]: a reference could not be pointed at the
//!   replacement. Reported, never fatal.
//! - [`TransactionError`]: the operation was refused or aborted. Any
//!   mutation already made has been rolled back when this is returned.

use serde::Serialize;
use std::path::PathBuf;
use swap_scene::{ComponentId, ComponentKind, FieldPath, NodeId, SceneError};

/// Invalid caller-supplied selection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// The same root was selected twice
    #[error("node {0} is selected more than once")]
    Duplicate(NodeId),
}

/// Identity lookup could not be built
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// Selected root is not alive in the scene
    #[error("selected node {0} does not exist")]
    UnknownNode(NodeId),

    /// One selected root lies inside another's subtree
    #[error("selected node {inner} lies inside selected node {outer}")]
    NestedSelection { outer: NodeId, inner: NodeId },

    /// Scene inconsistency while flattening
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Reference site left pointing at the original
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ResolutionFailure {
    /// Counterpart node lacks a component of the referenced kind
    #[error("{owner}.{path}: {node} has no {kind} component")]
    MissingComponent {
        owner: ComponentId,
        path: FieldPath,
        node: NodeId,
        kind: ComponentKind,
    },

    /// Referenced node has no counterpart in the replacement
    #[error("{owner}.{path}: {target} has no counterpart under {replacement}")]
    MissingCounterpart {
        owner: ComponentId,
        path: FieldPath,
        target: NodeId,
        replacement: NodeId,
    },
}

impl ResolutionFailure {
    /// Component holding the unresolved field
    #[inline]
    #[must_use]
    pub fn owner(&self) -> ComponentId {
        match self {
            Self::MissingComponent { owner, .. } | Self::MissingCounterpart { owner, .. } => *owner,
        }
    }

    /// Path of the unresolved field
    #[inline]
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        match self {
            Self::MissingComponent { path, .. } | Self::MissingCounterpart { path, .. } => path,
        }
    }
}

/// Replacement refused or aborted
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// Selection cannot be replaced as given
    #[error("invalid selection: {0}")]
    Lookup(#[from] LookupError),

    /// The scene is already recording another undo group
    #[error("another replacement is in progress")]
    InFlight,

    /// A step for one root failed; everything was rolled back
    #[error("replacing {root} failed: {source}")]
    Replace {
        root: NodeId,
        #[source]
        source: SceneError,
    },

    /// Opening or committing the undo group failed
    #[error("undo group error: {0}")]
    Journal(#[from] SceneError),

    /// Rolling back after a failure failed as well; the scene is inconsistent
    #[error("{cause}; rollback failed as well: {rollback}")]
    RollbackFailed {
        cause: Box<TransactionError>,
        rollback: SceneError,
    },
}

impl TransactionError {
    /// Check if the scene was left exactly as before the run
    #[inline]
    #[must_use]
    pub fn scene_unchanged(&self) -> bool {
        !matches!(self, Self::RollbackFailed { .. })
    }
}

/// Configuration could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File access failed
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
