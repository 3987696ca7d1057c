//! Run command: probe the selected regions and render the results table.

use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;
use tracing::info;

use crate::cli::RunArgs;
use crate::config::ProbeConfig;
use crate::probe::{EdgeClient, ProbeTarget, RegionOrchestrator, RegionRunState, RegionStatus};

/// Run the run command.
pub async fn run(args: RunArgs, json_output: bool, quiet: bool) -> Result<()> {
    info!("starting probe run command");

    let mut config = ProbeConfig::from_env();
    if let Some(base_url) = args.base_url {
        config.entry_base_url = base_url;
    }

    let client = EdgeClient::new(config).context("failed to build edge client")?;
    let orchestrator = RegionOrchestrator::new(Arc::new(client));

    if !args.regions.is_empty() {
        let ids: Vec<&str> = args.regions.iter().map(String::as_str).collect();
        orchestrator
            .configure(&ids)
            .await
            .context("failed to configure region subset")?;
    }

    let mut target = ProbeTarget::new(args.url);
    if let Some(api_key) = args.api_key {
        target = target.with_api_key(api_key);
    }

    if !quiet && !json_output {
        println!(
            "{}",
            "Edge Latency Probe - Global Cache Test".bright_cyan().bold()
        );
        println!();
    }

    orchestrator
        .start_run(target)
        .await
        .context("probe run failed to start")?;

    let states = orchestrator.snapshot().await;

    if json_output {
        let json = serde_json::to_string_pretty(&states)?;
        println!("{}", json);
    } else if !quiet {
        print_table(&states);
        print_summary(&states);
    }

    Ok(())
}

fn print_table(states: &[RegionRunState]) {
    println!(
        "{:8} {:28} {:10} {:>12} {:10} {:>10} {:>10} {:8}",
        "Region".bright_white().bold(),
        "Location".bright_white().bold(),
        "Upstream".bright_white().bold(),
        "Upstream ms".bright_white().bold(),
        "Edge".bright_white().bold(),
        "Edge ms".bright_white().bold(),
        "TTL".bright_white().bold(),
        "Status".bright_white().bold()
    );
    println!("{}", "-".repeat(104));

    for state in states {
        let (upstream_cache, upstream_ms, edge_cache, edge_ms, ttl) = match &state.result {
            Some(result) => (
                result.upstream_cache_state.to_string(),
                colorize_latency(result.upstream_latency_ms),
                result.edge_cache_state.to_string(),
                colorize_latency(result.edge_latency_ms),
                result.upstream_ttl(),
            ),
            None => (
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
            ),
        };

        let status = match state.status {
            RegionStatus::Complete => "PASS".bright_green(),
            RegionStatus::Error => "FAIL".bright_red(),
            RegionStatus::Testing => "....".bright_blue(),
            RegionStatus::Idle => "IDLE".normal(),
        };

        println!(
            "{:8} {} {:25} {:10} {:>12} {:10} {:>10} {:>10} {:8}",
            state.region.id,
            state.region.flag,
            state.region.city,
            upstream_cache,
            upstream_ms,
            edge_cache,
            edge_ms,
            ttl,
            status
        );

        if let Some(error) = &state.error {
            println!("         {}", error.bright_red());
        }
    }
    println!();
}

fn print_summary(states: &[RegionRunState]) {
    let completed: Vec<&RegionRunState> = states
        .iter()
        .filter(|s| s.status == RegionStatus::Complete)
        .collect();
    let failed = states
        .iter()
        .filter(|s| s.status == RegionStatus::Error)
        .count();

    println!(
        "{} Total: {} | {} | {}",
        "=>".bright_cyan(),
        format!("{} regions", states.len()).bright_white(),
        format!("{} completed", completed.len()).bright_green(),
        format!("{} failed", failed).bright_red()
    );

    if let Some(fastest) = fastest(&completed) {
        println!(
            "{} Fastest: {} ({}ms)",
            "=>".bright_cyan(),
            fastest.region.id.bright_green(),
            fastest
                .result
                .as_ref()
                .map(|r| r.edge_latency_ms)
                .unwrap_or(0)
        );
    }
    if let Some(slowest) = slowest(&completed) {
        println!(
            "{} Slowest: {} ({}ms)",
            "=>".bright_cyan(),
            slowest.region.id.bright_red(),
            slowest
                .result
                .as_ref()
                .map(|r| r.edge_latency_ms)
                .unwrap_or(0)
        );
    }
}

fn colorize_latency(latency_ms: u64) -> String {
    let text = format!("{}ms", latency_ms);
    let colored = match latency_ms {
        0..=100 => text.bright_green(),
        101..=300 => text.bright_yellow(),
        301..=500 => text.yellow(),
        _ => text.bright_red(),
    };
    colored.to_string()
}

fn fastest<'a>(completed: &[&'a RegionRunState]) -> Option<&'a RegionRunState> {
    completed
        .iter()
        .min_by_key(|s| {
            s.result
                .as_ref()
                .map(|r| r.edge_latency_ms)
                .unwrap_or(u64::MAX)
        })
        .copied()
}

fn slowest<'a>(completed: &[&'a RegionRunState]) -> Option<&'a RegionRunState> {
    completed
        .iter()
        .max_by_key(|s| s.result.as_ref().map(|r| r.edge_latency_ms).unwrap_or(0))
        .copied()
}
