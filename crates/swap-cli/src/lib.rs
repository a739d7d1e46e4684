//! Swap CLI
//!
//! Runs template replacement over JSON/YAML scene documents.
//!
//! ```text
//! swap replace --scene ui.yaml --template button.yaml --select play --select quit
//! swap inspect --scene ui.yaml --json
//! ```
//!
//! Exit codes: 0 on success, 1 when the transaction failed and was rolled
//! back, 2 for usage and input errors.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod inspect;
mod replace;

pub use inspect::{inspect, InspectReport, NodeEntry, ReferenceEntry};
pub use replace::{replace, ReplaceArgs, ReplaceSummary, ReplacedNode};

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use swap_engine::TransactionError;

/// Exit code for a rolled-back transaction
pub const EXIT_ROLLED_BACK: u8 = 1;
/// Exit code for usage and input errors
pub const EXIT_USAGE: u8 = 2;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Argument definitions
#[must_use]
pub fn command() -> Command {
    Command::new("swap")
        .version(VERSION)
        .about("Replace scene nodes with fresh template instances")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("replace")
                .about("Replace selected nodes with instances of a template")
                .arg(
                    Arg::new("scene")
                        .long("scene")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Scene document (.json, .yaml, .yml)"),
                )
                .arg(
                    Arg::new("template")
                        .long("template")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Template document"),
                )
                .arg(
                    Arg::new("template-root")
                        .long("template-root")
                        .help("Key of the template root (default: first top-level node)"),
                )
                .arg(
                    Arg::new("select")
                        .long("select")
                        .num_args(1..)
                        .action(ArgAction::Append)
                        .help("Keys of the nodes to replace, in order"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("Engine configuration (TOML)"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the result here instead of over the scene"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the summary as JSON"),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .about("List the hierarchy and every reference in a scene")
                .arg(
                    Arg::new("scene")
                        .long("scene")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Scene document"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print as JSON"),
                ),
        )
}

/// Run a parsed command line, writing results to `out`
///
/// # Errors
/// Returns any load, selection or transaction failure; see [`exit_code`]
pub fn execute(matches: &ArgMatches, out: &mut dyn Write) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("replace", args)) => {
            let summary = replace(&ReplaceArgs::from_matches(args)?)?;
            emit(out, args.get_flag("json"), &summary, ReplaceSummary::render)
        }
        Some(("inspect", args)) => {
            let scene = args
                .get_one::<PathBuf>("scene")
                .context("--scene is required")?;
            let report = inspect(scene)?;
            emit(out, args.get_flag("json"), &report, InspectReport::render)
        }
        _ => anyhow::bail!("no subcommand given"),
    }
}

/// Process exit code for a failed [`execute`]
///
/// Rejected selections count as usage errors; they never touch the scene.
#[must_use]
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<TransactionError>() {
        None | Some(TransactionError::Lookup(_)) => EXIT_USAGE,
        Some(_) => EXIT_ROLLED_BACK,
    }
}

fn emit<T: Serialize>(
    out: &mut dyn Write,
    json: bool,
    value: &T,
    render: fn(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, value)?;
        writeln!(out)?;
    } else {
        write!(out, "{}", render(value))?;
    }
    Ok(())
}
