//! Probe and orchestrator error taxonomy.
//!
//! Every probe failure is terminal for its region within the run: nothing
//! here is retried, and no error crosses the orchestrator boundary as a
//! panic or early return.

use thiserror::Error;

/// Failure of a single probe attempt.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The request never completed.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The entry point answered with a non-success status.
    #[error("entry point returned status {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The configured per-request timeout elapsed.
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// The response body or headers could not be interpreted.
    #[error("malformed probe response: {0}")]
    Parse(String),

    /// Client construction rejected the configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Run-lifecycle errors from the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestratorError {
    /// A run is already in flight; the request is a no-op and the active
    /// run is unaffected.
    #[error("a probe run is already in flight")]
    AlreadyRunning,

    /// The configured region subset is empty.
    #[error("no regions configured")]
    NoRegions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_display() {
        let err = ProbeError::Upstream {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "entry point returned status 502: bad gateway");
    }
}
