//! Replacement transaction
//!
//! One run replaces every selected root with a fresh instance of the
//! template:
//!
//! 1. validate the selection and flatten it into an identity lookup
//! 2. scan all references into the selection (before any mutation)
//! 3. open an undo group
//! 4. per root, in selection order: instantiate, reparent, rename, copy
//!    geometry, merge hierarchy, remap references, destroy the original and
//!    move the replacement into the original's sibling slot
//! 5. commit the group, or roll it back on the first error
//!
//! Unresolvable references are reported, not fatal.

use crate::config::EngineConfig;
use crate::error::{ResolutionFailure, TransactionError};
use crate::lookup::IdentityLookup;
use crate::merger::{HierarchyMerger, MergeReport};
use crate::remapper::{ReferenceRemapper, RemapReport};
use crate::scanner::{ReferenceScanner, ReferenceSite};
use crate::selection::Selection;
use serde::Serialize;
use swap_scene::{
    Instantiate, NodeId, ReferenceVisitor, Scene, SceneError, StoredFields, UndoGroup,
};

/// Outcome for one selected root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replacement {
    /// Destroyed original
    pub original: NodeId,
    /// Instance that took its place
    pub replacement: NodeId,
    /// Name carried over from the original
    pub name: String,
    /// Sibling slot the replacement now occupies
    pub sibling_index: usize,
    pub merge: MergeReport,
    pub remap: RemapReport,
}

/// Outcome of a run
#[derive(Debug)]
pub struct ReplacementReport {
    /// One entry per selected root, in selection order
    pub replacements: Vec<Replacement>,
    /// Undo group of the run; `None` when nothing was done
    pub undo: Option<UndoGroup>,
}

impl ReplacementReport {
    fn noop() -> Self {
        Self {
            replacements: Vec::new(),
            undo: None,
        }
    }

    /// Check if the run left the scene untouched
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.replacements.is_empty()
    }

    /// Unresolved references across all roots
    pub fn failures(&self) -> impl Iterator<Item = &ResolutionFailure> {
        self.replacements
            .iter()
            .flat_map(|replacement| replacement.remap.failures.iter())
    }

    /// Total fields rewritten across all roots
    #[must_use]
    pub fn rewritten(&self) -> usize {
        self.replacements.iter().map(|r| r.remap.rewritten).sum()
    }

    /// Take the undo group out of the report
    #[inline]
    pub fn take_undo(&mut self) -> Option<UndoGroup> {
        self.undo.take()
    }
}

/// Replaces selected roots with template instances, all or nothing
#[derive(Debug, Clone)]
pub struct ReplacementTransaction<V = StoredFields> {
    config: EngineConfig,
    scanner: ReferenceScanner<V>,
    merger: HierarchyMerger,
    remapper: ReferenceRemapper,
}

impl ReplacementTransaction<StoredFields> {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_visitor(config, StoredFields)
    }
}

impl Default for ReplacementTransaction<StoredFields> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl<V: ReferenceVisitor> ReplacementTransaction<V> {
    /// Transaction discovering reference fields through `visitor`
    #[must_use]
    pub fn with_visitor(config: EngineConfig, visitor: V) -> Self {
        Self {
            scanner: ReferenceScanner::with_visitor(&config, visitor),
            merger: HierarchyMerger::new(),
            remapper: ReferenceRemapper::new(&config),
            config,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace every root of `selection` with an instance of `template`
    ///
    /// Without a template, or with an empty selection, nothing happens and
    /// an empty report is returned.
    ///
    /// # Errors
    /// - [`TransactionError::InFlight`] if the scene is recording a group
    /// - [`TransactionError::Lookup`] for dead or nested roots
    /// - [`TransactionError::Replace`] if a step failed; the scene was
    ///   rolled back
    /// - [`TransactionError::RollbackFailed`] if the rollback failed too
    pub fn run<T>(
        &self,
        scene: &mut Scene,
        selection: &Selection,
        template: Option<&T>,
    ) -> Result<ReplacementReport, TransactionError>
    where
        T: Instantiate + ?Sized,
    {
        let Some(template) = template else {
            tracing::debug!("no template set, nothing to replace");
            return Ok(ReplacementReport::noop());
        };
        if selection.is_empty() {
            tracing::debug!("empty selection, nothing to replace");
            return Ok(ReplacementReport::noop());
        }
        if scene.has_open_group() {
            return Err(TransactionError::InFlight);
        }

        let label = template.label();
        let _span = tracing::info_span!(
            "replace",
            template = label.as_str(),
            roots = selection.len()
        )
        .entered();

        let lookup = IdentityLookup::build(scene, selection)?;
        let plan = self.scanner.scan(scene, &lookup);
        tracing::info!(
            "replacing {} node(s) with '{}' ({} reference sites)",
            selection.len(),
            label,
            plan.len()
        );

        scene.begin_group(self.config.undo_label.clone())?;

        let mut replacements = Vec::with_capacity(selection.len());
        for root in selection.iter() {
            match self.replace_root(scene, root, template, plan.sites_for(root)) {
                Ok(replacement) => replacements.push(replacement),
                Err(source) => {
                    let cause = TransactionError::Replace { root, source };
                    tracing::error!("{cause}, rolling back");
                    return Err(match scene.rollback_group() {
                        Ok(()) => cause,
                        Err(rollback) => {
                            tracing::error!("rollback failed: {rollback}");
                            TransactionError::RollbackFailed {
                                cause: Box::new(cause),
                                rollback,
                            }
                        }
                    });
                }
            }
        }

        let undo = scene.commit_group()?;
        let report = ReplacementReport {
            replacements,
            undo: Some(undo),
        };
        let failures = report.failures().count();
        if failures > 0 {
            tracing::warn!("{failures} reference(s) could not be remapped");
        }
        tracing::info!(
            "replaced {} node(s), rewrote {} reference(s)",
            report.replacements.len(),
            report.rewritten()
        );
        Ok(report)
    }

    fn replace_root<T>(
        &self,
        scene: &mut Scene,
        original: NodeId,
        template: &T,
        sites: &[ReferenceSite],
    ) -> Result<Replacement, SceneError>
    where
        T: Instantiate + ?Sized,
    {
        let parent = scene.parent(original)?;
        let name = scene.get(original)?.name().to_string();

        let replacement = template.instantiate(scene)?;
        scene.set_parent(replacement, parent)?;
        scene.set_name(replacement, name.clone())?;
        self.merger.copy_geometry(scene, original, replacement)?;
        let merge = self.merger.merge(scene, original, replacement)?;
        let remap = self
            .remapper
            .remap(scene, sites, original, replacement, &merge)?;

        let sibling_index = scene.sibling_index(original)?;
        scene.destroy(original)?;
        scene.set_sibling_index(replacement, sibling_index)?;
        let sibling_index = scene.sibling_index(replacement)?;

        tracing::debug!(
            "replaced {} '{}' with {} at index {}",
            original,
            name,
            replacement,
            sibling_index
        );
        Ok(Replacement {
            original,
            replacement,
            name,
            sibling_index,
            merge,
            remap,
        })
    }
}
