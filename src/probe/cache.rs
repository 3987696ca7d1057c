//! Cache-state classification and remaining-TTL rendering.
//!
//! Both the regional entry point and the upstream API report cache behavior
//! through headers. Classification is a pure, total function: anything that
//! is not one of the six known tokens maps to [`CacheState::Unknown`], and
//! TTL computation fails closed to [`UNKNOWN_TTL`] on absent or malformed
//! `cache-control` values instead of erroring.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Sentinel returned when the remaining TTL cannot be derived.
pub const UNKNOWN_TTL: &str = "unknown";

/// Normalized cache classification of a CDN/cache layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheState {
    /// Served from cache.
    Hit,
    /// Fetched from origin and stored.
    Miss,
    /// Cache deliberately skipped.
    Bypass,
    /// Cached copy past its TTL.
    Expired,
    /// Served stale while revalidating.
    Stale,
    /// Header absent or unrecognized.
    #[default]
    Unknown,
}

impl CacheState {
    /// Classify a raw cache-status token, case-insensitively.
    ///
    /// Absent, empty, and unrecognized values all map to `Unknown`.
    pub fn classify(token: Option<&str>) -> Self {
        match token.map(str::trim).unwrap_or("").to_ascii_uppercase().as_str() {
            "HIT" => Self::Hit,
            "MISS" => Self::Miss,
            "BYPASS" => Self::Bypass,
            "EXPIRED" => Self::Expired,
            "STALE" => Self::Stale,
            _ => Self::Unknown,
        }
    }

    /// Wire token for this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
            Self::Bypass => "BYPASS",
            Self::Expired => "EXPIRED",
            Self::Stale => "STALE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive header lookup over a flattened header bag.
pub fn header_value<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Remaining cache TTL derived from `age` and `cache-control: max-age=`.
///
/// `age` defaults to 0 when absent or non-numeric. A missing or malformed
/// `cache-control`/`max-age` yields [`UNKNOWN_TTL`]; this function never
/// fails. The result is `max(0, max_age - age)` rendered as a duration.
pub fn remaining_ttl(headers: &HashMap<String, String>) -> String {
    let age = header_value(headers, "age")
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(0);

    let max_age = match header_value(headers, "cache-control").and_then(parse_max_age) {
        Some(secs) => secs,
        None => return UNKNOWN_TTL.to_string(),
    };

    let remaining_ms = max_age.saturating_sub(age).saturating_mul(1000);
    format_duration_ms(remaining_ms)
}

/// Extract the `max-age` directive from a `cache-control` value.
fn parse_max_age(cache_control: &str) -> Option<u64> {
    cache_control.split(',').find_map(|directive| {
        let directive = directive.trim();
        let (name, value) = directive.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("max-age") {
            value.trim().parse::<u64>().ok()
        } else {
            None
        }
    })
}

/// Render milliseconds as a compact human duration, e.g. `"4m 30s"`.
pub fn format_duration_ms(ms: u64) -> String {
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(format!("{}s", seconds));
    }
    parts.join(" ")
}
