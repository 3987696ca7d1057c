//! Command-line interface.

use clap::{Args, Parser, Subcommand};

pub mod commands;

/// Multi-region latency and cache probe for metadata-extraction APIs.
#[derive(Debug, Parser)]
#[command(name = "edge-latency-probe", version, about)]
pub struct Cli {
    /// Emit machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Probe the selected regions and print the results table
    Run(RunArgs),
    /// List the built-in region catalog
    Regions,
}

/// Arguments for the `run` command.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Target URL the upstream metadata API will analyze
    #[arg(long, default_value = "https://microlink.io/docs")]
    pub url: String,

    /// Optional credential forwarded verbatim to the entry point
    #[arg(long)]
    pub api_key: Option<String>,

    /// Comma-separated region ids to probe (default: the whole catalog)
    #[arg(long, value_delimiter = ',')]
    pub regions: Vec<String>,

    /// Entry point base URL (overrides EDGE_PROBE_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,
}
