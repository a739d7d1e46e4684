//! `swap replace`

use anyhow::{anyhow, Context};
use clap::ArgMatches;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;
use swap_engine::{EngineConfig, ReplacementTransaction, Selection};
use swap_scene::{KeyMap, NodeId, ObjectRef, SceneDocument};

/// Inputs of a replace run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaceArgs {
    pub scene: PathBuf,
    pub template: PathBuf,
    pub template_root: Option<String>,
    pub select: Vec<String>,
    pub config: Option<PathBuf>,
    pub out: Option<PathBuf>,
}

impl ReplaceArgs {
    /// Read the `replace` subcommand arguments
    ///
    /// # Errors
    /// Fails if a required argument is missing
    pub fn from_matches(args: &ArgMatches) -> anyhow::Result<Self> {
        Ok(Self {
            scene: args
                .get_one::<PathBuf>("scene")
                .cloned()
                .context("--scene is required")?,
            template: args
                .get_one::<PathBuf>("template")
                .cloned()
                .context("--template is required")?,
            template_root: args.get_one::<String>("template-root").cloned(),
            select: args
                .get_many::<String>("select")
                .map(|keys| keys.cloned().collect())
                .unwrap_or_default(),
            config: args.get_one::<PathBuf>("config").cloned(),
            out: args.get_one::<PathBuf>("out").cloned(),
        })
    }
}

/// One replaced node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplacedNode {
    /// Document key, now naming the replacement
    pub key: String,
    pub name: String,
    pub sibling_index: usize,
    pub matched: usize,
    pub adopted: usize,
    pub rewritten: usize,
    pub failures: Vec<String>,
}

/// Outcome of a replace run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplaceSummary {
    pub template: String,
    /// Where the result was written; `None` when nothing changed
    pub output: Option<PathBuf>,
    pub replaced: Vec<ReplacedNode>,
}

impl ReplaceSummary {
    /// Human-readable summary
    #[must_use]
    pub fn render(&self) -> String {
        let mut text = String::new();
        if self.replaced.is_empty() {
            text.push_str("nothing selected, scene unchanged\n");
            return text;
        }

        let _ = writeln!(
            text,
            "replaced {} node(s) with '{}'",
            self.replaced.len(),
            self.template
        );
        for node in &self.replaced {
            let _ = writeln!(
                text,
                "  {} '{}' at index {}: {} matched, {} adopted, {} reference(s) rewritten",
                node.key, node.name, node.sibling_index, node.matched, node.adopted, node.rewritten
            );
            for failure in &node.failures {
                let _ = writeln!(text, "    unresolved: {failure}");
            }
        }
        if let Some(output) = &self.output {
            let _ = writeln!(text, "wrote {}", output.display());
        }
        text
    }
}

/// Load the documents, run the transaction and write the result
///
/// The replacement of each selected node inherits its document key.
///
/// # Errors
/// - document or configuration cannot be loaded or written
/// - a selected key is unknown or names a component
/// - the transaction failed (a [`swap_engine::TransactionError`]; nothing
///   is written)
pub fn replace(args: &ReplaceArgs) -> anyhow::Result<ReplaceSummary> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };

    let (mut scene, mut keys) = SceneDocument::load(&args.scene)
        .and_then(|document| document.to_scene())
        .with_context(|| format!("cannot load scene {}", args.scene.display()))?;
    let template = SceneDocument::load(&args.template)
        .and_then(|document| document.to_template(args.template_root.as_deref()))
        .with_context(|| format!("cannot load template {}", args.template.display()))?;

    let roots = args
        .select
        .iter()
        .map(|key| select(&keys, key))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let selection = Selection::new(roots)?;

    let mut report =
        ReplacementTransaction::new(config).run(&mut scene, &selection, Some(&template))?;
    if let Some(undo) = report.take_undo() {
        scene.discard_undo(undo);
    }

    let mut replaced = Vec::with_capacity(report.replacements.len());
    for (key, replacement) in args.select.iter().zip(&report.replacements) {
        keys.insert(key.clone(), ObjectRef::Node(replacement.replacement));
        replaced.push(ReplacedNode {
            key: key.clone(),
            name: replacement.name.clone(),
            sibling_index: replacement.sibling_index,
            matched: replacement.merge.matched,
            adopted: replacement.merge.adopted.len(),
            rewritten: replacement.remap.rewritten,
            failures: replacement
                .remap
                .failures
                .iter()
                .map(ToString::to_string)
                .collect(),
        });
    }

    let output = if report.is_noop() {
        None
    } else {
        let path = args.out.clone().unwrap_or_else(|| args.scene.clone());
        SceneDocument::from_scene(&scene, Some(&keys))
            .save(&path)
            .with_context(|| format!("cannot write {}", path.display()))?;
        tracing::info!("wrote {}", path.display());
        Some(path)
    };

    Ok(ReplaceSummary {
        template: template.name().to_string(),
        output,
        replaced,
    })
}

fn select(keys: &KeyMap, key: &str) -> anyhow::Result<NodeId> {
    match keys.get(key) {
        Some(ObjectRef::Node(id)) => Ok(*id),
        Some(ObjectRef::Component(_)) => Err(anyhow!("'{key}' names a component, not a node")),
        None => Err(anyhow!("no object with key '{key}'")),
    }
}
