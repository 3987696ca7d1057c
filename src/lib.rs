//! # edge-latency-probe
//!
//! Measures round-trip latency and cache behavior of a metadata-extraction
//! API from multiple edge locations. One run fans out a concurrent probe
//! per configured region, times the caller-observed leg against the leg
//! the entry point spent on the upstream API, classifies cache status from
//! response headers, and collects per-region outcomes independently — a
//! broken region never hides the others.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use edge_latency_probe::{EdgeClient, ProbeConfig, ProbeTarget, RegionOrchestrator};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = EdgeClient::new(ProbeConfig::default())?;
//! let orchestrator = RegionOrchestrator::new(Arc::new(client));
//! orchestrator.configure(&["iad1", "lhr1", "sin1"]).await?;
//! orchestrator.start_run(ProbeTarget::new("https://example.com")).await?;
//! for state in orchestrator.snapshot().await {
//!     println!("{}: {:?}", state.region.id, state.status);
//! }
//! # Ok(()) }
//! ```

use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod config;
pub mod probe;

#[cfg(feature = "relay")]
pub mod relay;

pub use config::ProbeConfig;
pub use probe::{
    remaining_ttl, CacheState, EdgeClient, OrchestratorError, ProbeError, ProbeResult,
    ProbeTarget, Prober, Region, RegionOrchestrator, RegionRunState, RegionStatus, Timer,
};

/// Errors from crate-level setup.
#[derive(Debug, Error)]
pub enum InitError {
    /// A global tracing subscriber was already installed.
    #[error("tracing subscriber already initialised: {0}")]
    Tracing(String),
}

/// Initialise the global tracing subscriber.
///
/// `LOG_FORMAT=json` selects structured JSON output for log aggregators;
/// anything else (including unset) gives human-readable output. The filter
/// level comes from `RUST_LOG`.
pub fn init_tracing() -> Result<(), InitError> {
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let result = match format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init(),
        _ => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init(),
    };

    result.map_err(|err| InitError::Tracing(err.to_string()))
}
