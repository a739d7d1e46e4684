//! Caller-chosen roots to replace

use crate::error::SelectionError;
use std::collections::HashSet;
use swap_scene::NodeId;

/// Ordered, duplicate-free list of roots
///
/// Roots are replaced in this order. Liveness and nesting are checked later,
/// against the scene, when the identity lookup is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    roots: Vec<NodeId>,
}

impl Selection {
    /// Build a selection, preserving order
    ///
    /// # Errors
    /// Returns [`SelectionError::Duplicate`] if a root appears twice
    pub fn new(roots: impl IntoIterator<Item = NodeId>) -> Result<Self, SelectionError> {
        let roots: Vec<NodeId> = roots.into_iter().collect();
        let mut seen = HashSet::with_capacity(roots.len());
        for &root in &roots {
            if !seen.insert(root) {
                return Err(SelectionError::Duplicate(root));
            }
        }
        Ok(Self { roots })
    }

    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.roots.iter().copied()
    }
}
