//! Plan command - Deployment order with resources sorted by tier.

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::order::report_cycle;
use super::{load_analyzer, load_snapshot, print_json, OutputFormat, SnapshotArgs};

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    snapshot: SnapshotArgs,
}

pub fn execute(args: PlanArgs) -> Result<()> {
    info!("Planning deployment of snapshot {:?}", args.snapshot.input);

    let analyzer = load_analyzer(args.snapshot.config.as_deref())?;
    let resources = load_snapshot(&args.snapshot.input)?;

    let plan = match analyzer.plan(&resources) {
        Ok(plan) => plan,
        Err(e) => {
            report_cycle(&e);
            return Err(e.into());
        }
    };

    if args.snapshot.format == OutputFormat::Json {
        return print_json(&plan);
    }

    if !plan.ungrouped.is_empty() {
        println!("🌐 (no group)");
        for record in &plan.ungrouped {
            println!("   [tier {}] {}", record.tier, record.resource.name);
        }
    }
    for (position, group) in plan.groups.iter().enumerate() {
        println!("{:>3}. {}", position + 1, group.group);
        for record in &group.resources {
            println!("     [tier {}] {}", record.tier, record.resource.name);
        }
    }
    println!();
    println!(
        "📦 {} resource(s) in {} group(s)",
        plan.resource_count(),
        plan.groups.len()
    );

    Ok(())
}
