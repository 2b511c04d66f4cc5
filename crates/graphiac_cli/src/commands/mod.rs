//! CLI command definitions.
//!
//! Each subcommand loads a resource snapshot, runs one operation of the
//! dependency engine and prints the result.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;

use graphiac_deps::{AnalyzerConfig, DependencyAnalyzer, ResourceDescriptor, ResourceSource, SnapshotFile};

pub mod analyze;
pub mod impact;
pub mod order;
pub mod plan;
pub mod sanitize;

/// graphiac - dependency analysis and deployment ordering for cloud resources
#[derive(Parser)]
#[command(name = "graphiac")]
#[command(version, about = "graphiac - dependency analysis and deployment ordering for cloud resources")]
#[command(long_about = r#"
graphiac reads a snapshot of discovered cloud resources and works out how
they depend on each other.

COMMANDS:
  analyze   → Tier and depends_on edges per resource
  order     → Deployment order of resource groups
  plan      → Deployment order with resources sorted by tier
  impact    → What-if checks for removing groups or moving resources
  sanitize  → Identifier names as used by generated code

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Dependency cycle detected
  4 - Impact warnings found (with --fail-on-warning)
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show tier and dependencies of every resource
    Analyze(analyze::AnalyzeArgs),

    /// Show the deployment order of resource groups
    Order(order::OrderArgs),

    /// Show the full deployment plan
    Plan(plan::PlanArgs),

    /// Check what a topology change would break
    #[command(subcommand)]
    Impact(impact::ImpactCommand),

    /// Print sanitized identifiers
    Sanitize(sanitize::SanitizeArgs),
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Arguments shared by commands that analyze one snapshot.
#[derive(Args)]
pub struct SnapshotArgs {
    /// Resource snapshot (.json, .yaml or .yml)
    #[arg(short, long, env = "GRAPHIAC_INPUT")]
    pub input: PathBuf,

    /// Analyzer configuration file
    #[arg(short, long, env = "GRAPHIAC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Failures raised by the commands themselves rather than the engine.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{0} impact warning(s) found")]
    ImpactWarnings(usize),
}

/// Build an analyzer, applying the configuration file when given.
pub fn load_analyzer(config: Option<&Path>) -> Result<DependencyAnalyzer> {
    match config {
        Some(path) => {
            let config = AnalyzerConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            Ok(DependencyAnalyzer::with_config(&config)?)
        }
        None => Ok(DependencyAnalyzer::new()),
    }
}

/// Load a resource snapshot from disk.
pub fn load_snapshot(path: &Path) -> Result<Vec<ResourceDescriptor>> {
    let source = SnapshotFile::new(path);
    source
        .load()
        .with_context(|| format!("Failed to load snapshot {}", source.path().display()))
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
