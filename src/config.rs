//! Probe client configuration.

use serde::{Deserialize, Serialize};

/// Default entry point base URL (local relay).
pub const DEFAULT_ENTRY_BASE_URL: &str = "http://localhost:3000";

/// Default response header carrying the entry point's cache token.
pub const DEFAULT_CACHE_HEADER: &str = "x-vercel-cache";

/// Configuration for [`EdgeClient`](crate::probe::edge::EdgeClient).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Base URL of the regional entry point service.
    pub entry_base_url: String,
    /// Header name holding the entry point's own cache-status token.
    pub cache_header: String,
    /// Optional per-request timeout in milliseconds. `None` means no
    /// internal timeout: a hung upstream call keeps its region `testing`.
    pub timeout_ms: Option<u64>,
    /// Enable gzip on the HTTP client.
    pub gzip: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            entry_base_url: DEFAULT_ENTRY_BASE_URL.to_string(),
            cache_header: DEFAULT_CACHE_HEADER.to_string(),
            timeout_ms: None,
            gzip: true,
        }
    }
}

impl ProbeConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            entry_base_url: std::env::var("EDGE_PROBE_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_ENTRY_BASE_URL.to_string()),
            cache_header: std::env::var("EDGE_PROBE_CACHE_HEADER")
                .unwrap_or_else(|_| DEFAULT_CACHE_HEADER.to_string()),
            timeout_ms: std::env::var("EDGE_PROBE_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok()),
            gzip: std::env::var("EDGE_PROBE_GZIP")
                .map(|s| s.to_lowercase() != "false")
                .unwrap_or(true),
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.entry_base_url.is_empty() {
            return Err("entry_base_url cannot be empty".to_string());
        }

        if !self.entry_base_url.starts_with("http://")
            && !self.entry_base_url.starts_with("https://")
        {
            return Err("entry_base_url must start with http:// or https://".to_string());
        }

        if self.cache_header.is_empty() {
            return Err("cache_header cannot be empty".to_string());
        }

        if self.timeout_ms == Some(0) {
            return Err("timeout_ms must be greater than 0 when set".to_string());
        }

        Ok(())
    }

    /// Entry point URL for one region.
    pub fn probe_url(&self, region_id: &str) -> String {
        format!(
            "{}/probe/{}",
            self.entry_base_url.trim_end_matches('/'),
            region_id
        )
    }
}
