use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tabledrag::{AttributesConnector, DEFAULT_KIND_ATTRIBUTE, EngineConfig, TableDrag, build_sequence};

use crate::driver::{Step, replay};
use crate::error::{HarnessError, Result};
use crate::logging::init_logging;
use crate::render::TextRenderer;
use crate::scenario::{Scenario, load_config, load_rows};

#[derive(Debug, Parser)]
#[command(
    name = "tabledrag",
    about = "Replay drag sessions and check row lists against tabledrag validators",
    version
)]
pub struct Cli {
    /// Emit machine-readable JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Log engine activity to stderr (overrides TABLEDRAG_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replay a scripted pointer session.
    Replay {
        /// Scenario JSON file.
        scenario: PathBuf,
    },

    /// Validate a row list against a validator configuration.
    Check(CheckArgs),

    /// Print a row list as an indented tree.
    Render(RowsArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RowsArgs {
    /// JSON array of row attribute objects.
    pub rows: PathBuf,

    /// Attribute carrying each row's type.
    #[arg(long, default_value = DEFAULT_KIND_ATTRIBUTE)]
    pub kind_attribute: String,
}

#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub rows: RowsArgs,

    /// Engine configuration JSON (defaults to the shape validator only).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl RowsArgs {
    fn connector(&self) -> AttributesConnector {
        AttributesConnector::default().with_kind_attribute(self.kind_attribute.clone())
    }
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let stdout = std::io::stdout();
    run(cli, &mut stdout.lock())
}

pub fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    match cli.command {
        Commands::Replay { scenario } => run_replay(&scenario, cli.json, out),
        Commands::Check(args) => run_check(&args, cli.json, out),
        Commands::Render(args) => run_render(&args, cli.json, out),
    }
}

fn run_replay(path: &Path, as_json: bool, out: &mut impl Write) -> Result<()> {
    let scenario = Scenario::load(path)?;
    let report = replay(&scenario)?;
    if as_json {
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
        return Ok(());
    }

    for step in &report.steps {
        match step {
            Step::Started { row, children, .. } => {
                writeln!(out, "start {row} (+{children} children)")?;
            }
            Step::Missed { origin } => {
                writeln!(out, "miss at ({}, {})", origin.x, origin.y)?;
            }
            Step::Over { outcome, .. } if outcome.is_rejected() => {
                writeln!(out, "rejected")?;
            }
            Step::Over { outcome, .. } if outcome.is_committed() => {
                writeln!(out, "committed")?;
            }
            Step::Over { .. } => {}
            Step::Finished { summary } => {
                let verb = if summary.canceled { "cancel" } else { "end" };
                writeln!(out, "{verb} {} (moved: {})", summary.dragged, summary.moved)?;
            }
        }
    }
    writeln!(
        out,
        "{} gesture(s), {} commit(s), {} rejection(s)",
        report.gestures,
        report.commits(),
        report.rejections()
    )?;
    write!(out, "{}", TextRenderer::default().render(&report.rows))?;
    Ok(())
}

fn run_check(args: &CheckArgs, as_json: bool, out: &mut impl Write) -> Result<()> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    let rows = load_rows(&args.rows.connector(), &args.rows.rows)?;
    let engine = TableDrag::new(rows, &config)?;
    let verdict = engine.validate_current();

    if as_json {
        let body = json!({
            "status": if verdict.is_accepted() { "ok" } else { "rejected" },
            "rows": engine.sequence().len(),
            "validators": engine.chain().names(),
            "vetoes": verdict.vetoes(),
        });
        serde_json::to_writer_pretty(&mut *out, &body)?;
        writeln!(out)?;
    } else if verdict.is_accepted() {
        writeln!(
            out,
            "ok: {} row(s) pass {}",
            engine.sequence().len(),
            engine.chain().names().join(", ")
        )?;
    } else {
        for veto in verdict.vetoes() {
            writeln!(out, "{veto}")?;
        }
    }

    if verdict.is_accepted() {
        Ok(())
    } else {
        Err(HarnessError::CheckFailed {
            vetoes: verdict.vetoes().len(),
        })
    }
}

fn run_render(args: &RowsArgs, as_json: bool, out: &mut impl Write) -> Result<()> {
    let sequence = build_sequence(load_rows(&args.connector(), &args.rows)?)?;
    if as_json {
        serde_json::to_writer_pretty(&mut *out, &sequence)?;
        writeln!(out)?;
    } else {
        write!(out, "{}", TextRenderer::default().render(&sequence))?;
    }
    Ok(())
}
