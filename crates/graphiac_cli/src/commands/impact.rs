//! Impact command - What-if checks for topology changes.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use tracing::info;

use graphiac_deps::ImpactReport;

use super::{load_analyzer, load_snapshot, print_json, CommandError, OutputFormat};

#[derive(Subcommand)]
pub enum ImpactCommand {
    /// Report references that break when only the kept groups survive
    Remove(RemoveArgs),

    /// Report references that break when resources change group
    Move(MoveArgs),
}

#[derive(Args)]
pub struct RemoveArgs {
    /// Resource snapshot (.json, .yaml or .yml)
    #[arg(short, long, env = "GRAPHIAC_INPUT")]
    input: PathBuf,

    /// Group that survives the change (repeatable)
    #[arg(short, long = "keep")]
    keep: Vec<String>,

    #[command(flatten)]
    options: ImpactOptions,
}

#[derive(Args)]
pub struct MoveArgs {
    /// Snapshot of the current topology
    #[arg(long)]
    current: PathBuf,

    /// Snapshot of the proposed topology
    #[arg(long)]
    proposed: PathBuf,

    #[command(flatten)]
    options: ImpactOptions,
}

#[derive(Args)]
struct ImpactOptions {
    /// Analyzer configuration file
    #[arg(short, long, env = "GRAPHIAC_CONFIG")]
    config: Option<PathBuf>,

    /// Exit with code 4 when any warning is found
    #[arg(long)]
    fail_on_warning: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

pub fn execute(command: ImpactCommand) -> Result<()> {
    match command {
        ImpactCommand::Remove(args) => {
            info!("Checking removal impact for {:?}", args.input);
            let analyzer = load_analyzer(args.options.config.as_deref())?;
            let resources = load_snapshot(&args.input)?;
            let surviving: BTreeSet<String> = args.keep.into_iter().collect();

            let report = ImpactReport::new(analyzer.impact_of_removal(&resources, &surviving));
            finish(&report, &args.options)
        }
        ImpactCommand::Move(args) => {
            info!("Checking move impact {:?} -> {:?}", args.current, args.proposed);
            let analyzer = load_analyzer(args.options.config.as_deref())?;
            let current = load_snapshot(&args.current)?;
            let proposed = load_snapshot(&args.proposed)?;

            let report = ImpactReport::new(analyzer.impact_of_move(&current, &proposed));
            finish(&report, &args.options)
        }
    }
}

fn finish(report: &ImpactReport, options: &ImpactOptions) -> Result<()> {
    if options.format == OutputFormat::Json {
        print_json(report)?;
    } else if report.is_clean() {
        println!("✅ No references would break");
    } else {
        for warning in &report.warnings {
            println!("⚠️  {}", warning);
        }
        println!();
        println!(
            "{} warning(s) affecting: {}",
            report.len(),
            report.affected_groups().into_iter().collect::<Vec<_>>().join(", ")
        );
    }

    if options.fail_on_warning && !report.is_clean() {
        return Err(CommandError::ImpactWarnings(report.len()).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SNAPSHOT: &str = r#"[
        {"type": "Microsoft.Network/networkInterfaces", "name": "nic1", "group": "network"},
        {"type": "Microsoft.Compute/virtualMachines", "name": "vm1", "group": "compute",
         "properties": {"nic": "/subscriptions/0/resourceGroups/network/providers/Microsoft.Network/networkInterfaces/nic1"}}
    ]"#;

    fn options(fail_on_warning: bool) -> ImpactOptions {
        ImpactOptions {
            config: None,
            fail_on_warning,
            format: OutputFormat::Json,
        }
    }

    #[test]
    fn test_remove_fails_on_warning() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("resources.json");
        fs::write(&input, SNAPSHOT).unwrap();

        let err = execute(ImpactCommand::Remove(RemoveArgs {
            input,
            keep: vec!["compute".to_string()],
            options: options(true),
        }))
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CommandError>(),
            Some(CommandError::ImpactWarnings(1))
        ));
    }

    #[test]
    fn test_remove_without_flag_succeeds() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("resources.json");
        fs::write(&input, SNAPSHOT).unwrap();

        let result = execute(ImpactCommand::Remove(RemoveArgs {
            input,
            keep: Vec::new(),
            options: options(false),
        }));
        assert!(result.is_ok());
    }

    #[test]
    fn test_clean_report_passes_with_flag() {
        assert!(finish(&ImpactReport::default(), &options(true)).is_ok());
    }
}
