//! Order command - Deployment order of resource groups.

use anyhow::Result;
use clap::Args;
use tracing::info;

use graphiac_deps::DepsError;

use super::{load_analyzer, load_snapshot, print_json, OutputFormat, SnapshotArgs};

#[derive(Args)]
pub struct OrderArgs {
    #[command(flatten)]
    snapshot: SnapshotArgs,
}

pub fn execute(args: OrderArgs) -> Result<()> {
    info!("Ordering groups of snapshot {:?}", args.snapshot.input);

    let analyzer = load_analyzer(args.snapshot.config.as_deref())?;
    let resources = load_snapshot(&args.snapshot.input)?;

    let order = match analyzer.deployment_order(&resources) {
        Ok(order) => order,
        Err(e) => {
            report_cycle(&e);
            return Err(e.into());
        }
    };

    if args.snapshot.format == OutputFormat::Json {
        return print_json(&order);
    }

    for (position, group) in order.iter().enumerate() {
        println!("{:>3}. {}", position + 1, group);
    }

    Ok(())
}

/// Print the groups that could not be ordered and the cycles among them.
pub fn report_cycle(error: &DepsError) {
    if let DepsError::CycleDetected { groups, cycles } = error {
        println!("🔁 {} group(s) could not be ordered:", groups.len());
        for group in groups {
            println!("   - {}", group);
        }
        for cycle in cycles {
            if let Some(first) = cycle.first() {
                println!("   cycle: {} → {}", cycle.join(" → "), first);
            }
        }
    }
}
