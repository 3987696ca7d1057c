//! Single-region probe over HTTP.
//!
//! One probe issues one GET through a regional entry point and times two
//! legs: the caller-observed round trip and the latency the entry point
//! itself measured against the upstream API (carried in the JSON body).
//! Requests carry no cache-suppression headers; being served from cache is
//! the behavior under test.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::HeaderMap;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::ProbeConfig;

use super::cache::{header_value, CacheState};
use super::error::ProbeError;
use super::result::ProbeResult;
use super::timer::Timer;

/// What a run probes: the URL handed to the upstream metadata API, plus an
/// optional credential forwarded verbatim as a query parameter.
#[derive(Debug, Clone)]
pub struct ProbeTarget {
    /// URL the upstream API will extract metadata from. Not validated
    /// here; well-formedness is the caller's concern.
    pub url: String,
    /// Opaque credential, forwarded as-is when present.
    pub api_key: Option<String>,
}

impl ProbeTarget {
    /// Target without a credential.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
        }
    }

    /// Attach a credential.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// JSON body returned by the entry point on success.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryPointBody {
    upstream_latency_ms: u64,
    #[serde(default)]
    upstream_cache_state: Option<String>,
    #[serde(default)]
    upstream_headers: HashMap<String, String>,
}

/// Seam between the orchestrator and the network.
///
/// The orchestrator fans out through this trait, so tests drive it with a
/// scripted implementation instead of live HTTP.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe one region. A failure is terminal for that region this run.
    async fn probe(&self, region_id: &str, target: &ProbeTarget)
        -> Result<ProbeResult, ProbeError>;
}

/// HTTP prober against the regional entry point service.
pub struct EdgeClient {
    client: Client,
    config: ProbeConfig,
}

impl EdgeClient {
    /// Build a client from configuration.
    pub fn new(config: ProbeConfig) -> Result<Self, ProbeError> {
        config.validate().map_err(ProbeError::InvalidConfig)?;

        let mut builder = Client::builder().gzip(config.gzip);
        if let Some(ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let client = builder.build()?;

        Ok(Self { client, config })
    }

    /// Build a client from environment configuration.
    pub fn from_env() -> Result<Self, ProbeError> {
        Self::new(ProbeConfig::from_env())
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }
}

#[async_trait]
impl Prober for EdgeClient {
    #[instrument(skip(self, target), fields(region = %region_id))]
    async fn probe(
        &self,
        region_id: &str,
        target: &ProbeTarget,
    ) -> Result<ProbeResult, ProbeError> {
        let url = self.config.probe_url(region_id);
        let timer = Timer::start();

        let mut request = self.client.get(&url).query(&[("url", target.url.as_str())]);
        if let Some(ref api_key) = target.api_key {
            request = request.query(&[("apiKey", api_key.as_str())]);
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                ProbeError::Timeout(self.config.timeout_ms.unwrap_or_default())
            } else {
                ProbeError::Network(err)
            }
        })?;

        // Round trip ends when the entry point answers; body transfer is
        // not part of the measured leg.
        let edge_latency_ms = timer.elapsed_ms();

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProbeError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let edge_headers = flatten_headers(response.headers());
        let body: EntryPointBody = response
            .json()
            .await
            .map_err(|err| ProbeError::Parse(err.to_string()))?;

        let edge_cache_state =
            CacheState::classify(header_value(&edge_headers, &self.config.cache_header));
        let upstream_cache_state = CacheState::classify(body.upstream_cache_state.as_deref());

        debug!(
            edge_latency_ms,
            upstream_latency_ms = body.upstream_latency_ms,
            edge_cache = %edge_cache_state,
            upstream_cache = %upstream_cache_state,
            "probe settled"
        );

        Ok(ProbeResult {
            region_id: region_id.to_string(),
            edge_latency_ms,
            upstream_latency_ms: body.upstream_latency_ms,
            upstream_cache_state,
            upstream_headers: body.upstream_headers,
            edge_cache_state,
            edge_headers,
            measured_at: Utc::now(),
        })
    }
}

/// Flatten a reqwest header map into plain string pairs, lossily decoding
/// non-UTF-8 values. Later duplicates win, which is fine for the headers
/// the TTL display reads.
pub(crate) fn flatten_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}
