//! ksd - Kubernetes snapshot diff CLI tool
//!
//! Compares two snapshots of Kubernetes resources and writes a summary of
//! what differs along with the per-resource diffs.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kube_snapshot_diff::report::{self, Options, Report};
use kube_snapshot_diff::source::{Includes, LabelSelector, SourceDescriptor};
use tracing::Level;
use tracing_subscriber::EnvFilter;

const SUMMARY_FILE: &str = "summary.txt";
const ITEM_DIFFS_FILE: &str = "item-diffs.txt";

#[derive(Parser)]
#[command(name = "ksd")]
#[command(about = "Compare two snapshots of Kubernetes resources", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<Level>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Diff two sources, each given as <type>=<location>
    ///
    /// Types are cluster (location is a kubeconfig path, empty for the
    /// default), backup (a .tar.gz archive), directory and repo
    /// (url[#ref]).
    Diff {
        /// Left-hand source
        left: SourceDescriptor,

        /// Right-hand source
        right: SourceDescriptor,

        /// Directory to write summary.txt and item-diffs.txt into
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Scopes to include: "cluster" or a namespace name (default: all)
        #[arg(long, value_delimiter = ',')]
        included_scopes: Vec<String>,

        /// Label selector resources must match
        #[arg(long, default_value = "")]
        selector: LabelSelector,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Logs go to stderr. The level comes from `--log-level`, else `RUST_LOG`,
/// else warnings only.
fn init_logging(log_level: Option<Level>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level.as_str()),
        None => EnvFilter::builder()
            .with_default_directive(Level::WARN.into())
            .from_env_lossy(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Diff {
            left,
            right,
            output_dir,
            included_scopes,
            selector,
        } => diff(&left, &right, &output_dir, included_scopes, selector),
    }
}

fn diff(
    left: &SourceDescriptor,
    right: &SourceDescriptor,
    output_dir: &Path,
    included_scopes: Vec<String>,
    selector: LabelSelector,
) -> Result<()> {
    let options = Options {
        left: left
            .open()
            .with_context(|| format!("opening left source {}", left))?,
        right: right
            .open()
            .with_context(|| format!("opening right source {}", right))?,
        scopes: Includes::new(included_scopes),
        selector,
    };

    let report = report::generate(&options).context("generating report")?;

    let mut stdout = io::stdout().lock();
    report::print_deltas(&report.both, &mut stdout, true).context("printing diffs")?;
    stdout.flush()?;

    write_outputs(&report, output_dir)
}

fn write_outputs(report: &Report, output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let path = output_dir.join(SUMMARY_FILE);
    let mut summary = Vec::new();
    report::print_report_summary(report, &mut summary)?;
    fs::write(&path, summary).with_context(|| format!("writing {}", path.display()))?;

    let path = output_dir.join(ITEM_DIFFS_FILE);
    let mut item_diffs = Vec::new();
    report::print_deltas(&report.both, &mut item_diffs, false)?;
    fs::write(&path, item_diffs).with_context(|| format!("writing {}", path.display()))?;

    tracing::info!(dir = %output_dir.display(), "wrote report");
    Ok(())
}
