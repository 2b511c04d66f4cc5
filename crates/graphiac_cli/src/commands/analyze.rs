//! Analyze command - Tier and dependencies per resource.

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::{load_analyzer, load_snapshot, print_json, OutputFormat, SnapshotArgs};

#[derive(Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    snapshot: SnapshotArgs,
}

pub fn execute(args: AnalyzeArgs) -> Result<()> {
    info!("Analyzing snapshot {:?}", args.snapshot.input);

    let analyzer = load_analyzer(args.snapshot.config.as_deref())?;
    let resources = load_snapshot(&args.snapshot.input)?;
    let records = analyzer.analyze(&resources);

    if args.snapshot.format == OutputFormat::Json {
        return print_json(&records);
    }

    for record in &records {
        let group = record.resource.group_name().unwrap_or("-");
        println!(
            "[tier {}] {} ({}) in {}",
            record.tier, record.resource.name, record.resource.resource_type, group
        );
        for target in &record.depends_on {
            println!("    → {}", target);
        }
    }
    println!();
    println!("📦 {} resource(s) analyzed", records.len());

    Ok(())
}
