//! Probe result and per-region run state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::cache::{remaining_ttl, CacheState};
use super::region::Region;

/// Outcome of one probe attempt through one regional entry point.
///
/// Both hops' header bags are retained verbatim: the remaining-TTL display
/// is derived from them, not from the cache token alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    /// Region the probe went through.
    pub region_id: String,
    /// Full round trip observed by the caller, in milliseconds.
    pub edge_latency_ms: u64,
    /// Time the entry point spent calling the upstream API, in milliseconds.
    ///
    /// Expected to be <= `edge_latency_ms`, but clock skew across hops can
    /// violate that and must not be treated as an error.
    pub upstream_latency_ms: u64,
    /// Cache classification reported for the upstream API hop.
    pub upstream_cache_state: CacheState,
    /// Response headers the entry point saw from the upstream API.
    pub upstream_headers: HashMap<String, String>,
    /// Cache classification of the entry point's own response.
    pub edge_cache_state: CacheState,
    /// Response headers of the entry point itself.
    pub edge_headers: HashMap<String, String>,
    /// When the probe settled.
    pub measured_at: DateTime<Utc>,
}

impl ProbeResult {
    /// Remaining TTL of the upstream API's cached copy.
    pub fn upstream_ttl(&self) -> String {
        remaining_ttl(&self.upstream_headers)
    }

    /// Remaining TTL of the entry point's cached copy.
    pub fn edge_ttl(&self) -> String {
        remaining_ttl(&self.edge_headers)
    }
}

/// Lifecycle of one region within a run.
///
/// `idle -> testing -> {complete, error}`; a new run moves terminal states
/// back to `testing`. `idle` is reachable from a terminal state only by
/// reconfiguring the region subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionStatus {
    /// Not probed since (re)configuration.
    #[default]
    Idle,
    /// Probe in flight.
    Testing,
    /// Probe settled with a result.
    Complete,
    /// Probe settled with a failure.
    Error,
}

/// Mutable per-region entry owned by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRunState {
    /// Static region configuration.
    pub region: Region,
    /// Current lifecycle status.
    pub status: RegionStatus,
    /// Last settled result. Retained across run starts so the UI never
    /// flashes back to empty mid-run; cleared only when this region errors
    /// or is reconfigured.
    pub result: Option<ProbeResult>,
    /// Failure message from the last run, if the region errored.
    pub error: Option<String>,
}

impl RegionRunState {
    /// Fresh idle entry for a region.
    pub fn idle(region: Region) -> Self {
        Self {
            region,
            status: RegionStatus::Idle,
            result: None,
            error: None,
        }
    }

    /// Whether this region has settled (either way) in the current run.
    pub fn is_settled(&self) -> bool {
        matches!(self.status, RegionStatus::Complete | RegionStatus::Error)
    }
}
