//! Reference remapping
//!
//! Rewrites the sites captured by the scanner so they point at the
//! replacement instead of the original that is about to be destroyed.

use crate::config::EngineConfig;
use crate::error::ResolutionFailure;
use crate::merger::MergeReport;
use crate::scanner::{ReferenceSite, TargetKind};
use serde::Serialize;
use swap_scene::{FieldValue, NodeId, Scene, SceneError};

/// Outcome of remapping the sites of one root
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemapReport {
    /// Fields written
    pub rewritten: usize,
    /// Fields already pointing at the right object, or at a node that was
    /// moved under the replacement
    pub unchanged: usize,
    /// Sites not processed: owner destroyed, or descendant remap disabled
    pub skipped: usize,
    /// Sites left pointing at the original
    pub failures: Vec<ResolutionFailure>,
}

/// Retargets references from an original onto its replacement
#[derive(Debug, Clone, Copy)]
pub struct ReferenceRemapper {
    remap_descendants: bool,
}

impl ReferenceRemapper {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            remap_descendants: config.remap_descendants,
        }
    }

    /// Rewrite `sites` from `original` onto `replacement`
    ///
    /// Unresolvable sites are reported in [`RemapReport::failures`] and
    /// never abort the run.
    ///
    /// # Errors
    /// Propagates [`SceneError`] from field writes
    pub fn remap(
        &self,
        scene: &mut Scene,
        sites: &[ReferenceSite],
        original: NodeId,
        replacement: NodeId,
        merge: &MergeReport,
    ) -> Result<RemapReport, SceneError> {
        let mut report = RemapReport::default();

        for site in sites {
            if !scene.contains_component(site.owner) {
                tracing::debug!("skipping {}.{}: owner destroyed", site.owner, site.path);
                report.skipped += 1;
                continue;
            }

            let node = if site.effective_target == original {
                replacement
            } else if !self.remap_descendants {
                report.skipped += 1;
                continue;
            } else if let Some(counterpart) = merge.counterpart(site.effective_target) {
                counterpart
            } else if scene.is_in_subtree(site.effective_target, replacement) {
                // Adopted along with its subtree; the target survives as is.
                report.unchanged += 1;
                continue;
            } else {
                let failure = ResolutionFailure::MissingCounterpart {
                    owner: site.owner,
                    path: site.path.clone(),
                    target: site.effective_target,
                    replacement,
                };
                tracing::warn!("unresolved reference: {failure}");
                report.failures.push(failure);
                continue;
            };

            let value = match &site.kind {
                TargetKind::Node => FieldValue::node(node),
                TargetKind::Component(kind) => match scene.component_of_kind(node, kind) {
                    Some(component) => FieldValue::component(component),
                    None => {
                        let failure = ResolutionFailure::MissingComponent {
                            owner: site.owner,
                            path: site.path.clone(),
                            node,
                            kind: kind.clone(),
                        };
                        tracing::warn!("unresolved reference: {failure}");
                        report.failures.push(failure);
                        continue;
                    }
                },
            };

            let current = scene
                .component(site.owner)
                .and_then(|component| component.field(&site.path));
            if current == Some(&value) {
                report.unchanged += 1;
                continue;
            }

            scene.set_field(site.owner, site.path.clone(), value)?;
            report.rewritten += 1;
        }

        Ok(report)
    }
}
