//! Engine configuration
//!
//! Loaded from TOML; every key is optional:
//!
//! ```toml
//! structural_kinds = ["Transform", "RectTransform"]
//! remap_descendants = true
//! undo_label = "Replace with template"
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use swap_scene::ComponentKind;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Component kinds that describe placement rather than references; never scanned
    pub structural_kinds: Vec<ComponentKind>,
    /// Also retarget references into the selected subtrees, not only at their roots
    pub remap_descendants: bool,
    /// Label of the undo group wrapping a run
    pub undo_label: String,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With structural component kinds
    #[inline]
    #[must_use]
    pub fn with_structural_kinds<I, K>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<ComponentKind>,
    {
        self.structural_kinds = kinds.into_iter().map(Into::into).collect();
        self
    }

    /// With descendant remapping on or off
    #[inline]
    #[must_use]
    pub fn with_remap_descendants(mut self, remap: bool) -> Self {
        self.remap_descendants = remap;
        self
    }

    /// With undo group label
    #[inline]
    #[must_use]
    pub fn with_undo_label(mut self, label: impl Into<String>) -> Self {
        self.undo_label = label.into();
        self
    }

    /// Check if components of `kind` are skipped by the scanner
    #[must_use]
    pub fn is_structural(&self, kind: &ComponentKind) -> bool {
        self.structural_kinds.contains(kind)
    }

    /// Parse TOML
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] on malformed input
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError`] on IO failure or malformed input
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            structural_kinds: vec![
                ComponentKind::new("Transform"),
                ComponentKind::new("RectTransform"),
            ],
            remap_descendants: true,
            undo_label: "Replace with template".to_string(),
        }
    }
}
