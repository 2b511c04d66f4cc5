//! Sanitize command - Print identifiers as generated code names them.

use anyhow::Result;
use clap::Args;

use graphiac_deps::sanitize_identifier;

#[derive(Args)]
pub struct SanitizeArgs {
    /// Names to sanitize
    #[arg(required = true)]
    names: Vec<String>,
}

pub fn execute(args: SanitizeArgs) -> Result<()> {
    for name in &args.names {
        println!("{}\t{}", name, sanitize_identifier(name));
    }
    Ok(())
}
