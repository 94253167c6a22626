use anyhow::{Context, Result};
use clap::Parser;
use tmplcfg::{cli, logging};

fn main() -> Result<()> {
    let args = cli::Args::parse();
    logging::boot_logger(&args.log_config()).context("failed to initialise logging")?;

    let output = args.run().context("failed to load configuration")?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
