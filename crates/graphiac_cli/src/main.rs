//! graphiac CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Dependency cycle detected
//! - 4: Impact warnings found (with `--fail-on-warning`)

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, CommandError, Commands};
use graphiac_deps::DepsError;

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const CYCLE_DETECTED: u8 = 3;
    pub const IMPACT_WARNINGS: u8 = 4;
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive(format!("graphiac={}", level).parse().unwrap())
                .add_directive("warn".parse().unwrap()),
        )
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = match cli.command {
        Commands::Analyze(args) => commands::analyze::execute(args),
        Commands::Order(args) => commands::order::execute(args),
        Commands::Plan(args) => commands::plan::execute(args),
        Commands::Impact(args) => commands::impact::execute(args),
        Commands::Sanitize(args) => commands::sanitize::execute(args),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    if let Some(deps) = e.downcast_ref::<DepsError>() {
        return match deps {
            DepsError::CycleDetected { .. } => ExitCodes::CYCLE_DETECTED,
            DepsError::InvalidConfiguration(_) | DepsError::UnsupportedFormat(_) => {
                ExitCodes::INVALID_ARGS
            }
            _ => ExitCodes::GENERAL_ERROR,
        };
    }
    if let Some(CommandError::ImpactWarnings(_)) = e.downcast_ref::<CommandError>() {
        return ExitCodes::IMPACT_WARNINGS;
    }
    ExitCodes::GENERAL_ERROR
}
