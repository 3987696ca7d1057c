//! Multi-region latency and cache probe.
//!
//! The core of the crate: fan out one probe per configured edge region,
//! time both legs of each round trip, classify cache behavior from response
//! headers, and expose a race-free per-region result set that can be
//! rendered at any point, including mid-run.

pub mod cache;
pub mod edge;
pub mod error;
pub mod orchestrator;
pub mod region;
pub mod result;
pub mod timer;

pub use cache::{format_duration_ms, remaining_ttl, CacheState, UNKNOWN_TTL};
pub use edge::{EdgeClient, ProbeTarget, Prober};
pub use error::{OrchestratorError, ProbeError};
pub use orchestrator::RegionOrchestrator;
pub use region::Region;
pub use result::{ProbeResult, RegionRunState, RegionStatus};
pub use timer::Timer;
