//! Binary entry point.

use anyhow::{Context, Result};
use clap::Parser;

use edge_latency_probe::cli::{commands, Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    edge_latency_probe::init_tracing().context("failed to initialise tracing")?;

    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => commands::run::run(args, cli.json, cli.quiet).await,
        Command::Regions => commands::regions::run(cli.json, cli.quiet),
    }
}
