//! Regional entry point relay.
//!
//! The service boundary the probes call: receives
//! `GET /probe/{region}?url=<target>&apiKey=<credential>`, forwards to the
//! upstream metadata API, measures the upstream leg, classifies the
//! upstream's `cf-cache-status`, and mirrors the upstream's caching headers
//! (`cache-control`, `age`, `etag`) onto its own response so the caller's
//! cache layer behaves like the upstream's.
//!
//! Deployed once per edge region; the region id in the path is informational
//! (each deployment already *is* its region).

use hyper::{Body, Method, Request, Response, StatusCode};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::OnceLock;
use tracing::{error, info};

use crate::probe::cache::{header_value, CacheState};
use crate::probe::edge::flatten_headers;
use crate::probe::timer::Timer;

/// Upstream metadata API, free tier.
pub const FREE_UPSTREAM_URL: &str = "https://api.microlink.io";

/// Upstream metadata API, credentialed tier.
pub const PRO_UPSTREAM_URL: &str = "https://pro.microlink.io";

/// Header the upstream's CDN reports its cache status in.
const UPSTREAM_CACHE_HEADER: &str = "cf-cache-status";

/// Caching headers mirrored from the upstream response.
const MIRRORED_HEADERS: &[&str] = &["cache-control", "age", "etag"];

/// Shared upstream HTTP client, built once so connection pooling survives
/// across requests.
fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(reqwest::Client::new)
}

/// HTTP entry point for the relay.
///
/// Handles the request/response lifecycle for one probe leg. Errors are
/// reported as JSON bodies, never as a dropped connection.
pub async fn http_entry_point(
    req: Request<Body>,
) -> Result<Response<Body>, Infallible> {
    if req.method() == Method::OPTIONS {
        return Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Access-Control-Allow-Origin", "*")
            .body(Body::empty())
            .unwrap_or_default());
    }

    let region = req
        .uri()
        .path()
        .rsplit('/')
        .next()
        .unwrap_or("unknown")
        .to_string();
    let query = parse_query(req.uri().query());

    let Some(target_url) = query.get("url") else {
        return Ok(json_response(
            StatusCode::BAD_REQUEST,
            serde_json::json!({ "error": "url is required" }),
        ));
    };
    let api_key = query.get("apiKey");

    let base = if api_key.is_some() {
        PRO_UPSTREAM_URL
    } else {
        FREE_UPSTREAM_URL
    };

    let mut request = http_client()
        .get(base)
        .query(&[("url", target_url.as_str())])
        .header("Content-Type", "application/json");
    if let Some(key) = api_key {
        request = request.header("x-api-key", key.as_str());
    }

    let timer = Timer::start();
    let upstream = match request.send().await {
        Ok(response) => response,
        Err(err) => {
            error!(%region, error = %err, "upstream metadata request failed");
            return Ok(json_response(
                StatusCode::BAD_GATEWAY,
                serde_json::json!({ "error": format!("upstream request failed: {}", err) }),
            ));
        }
    };
    let upstream_latency_ms = timer.elapsed_ms();

    let status = upstream.status();
    if !status.is_success() {
        return Ok(json_response(
            StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
            serde_json::json!({
                "error": "upstream metadata request failed",
                "status": status.as_u16(),
            }),
        ));
    }

    let upstream_headers = flatten_headers(upstream.headers());
    let cache_state =
        CacheState::classify(header_value(&upstream_headers, UPSTREAM_CACHE_HEADER));

    info!(
        %region,
        upstream_latency_ms,
        cache = %cache_state,
        "relayed probe request"
    );

    let body = serde_json::json!({
        "upstreamLatencyMs": upstream_latency_ms,
        "upstreamCacheState": cache_state,
        "upstreamHeaders": upstream_headers,
    });

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*");

    for name in MIRRORED_HEADERS {
        if let Some(value) = header_value(&upstream_headers, name) {
            builder = builder.header(*name, value);
            if name.eq_ignore_ascii_case("cache-control") {
                builder = builder.header("CDN-Cache-Control", value);
            }
        }
    }

    let json = serde_json::to_string(&body).unwrap_or_default();
    Ok(builder.body(Body::from(json)).unwrap_or_default())
}

/// Decode the request query string into a flat key/value map.
fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default()
}

fn json_response(status: StatusCode, body: serde_json::Value) -> Response<Body> {
    let json = serde_json::to_string(&body).unwrap_or_default();
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Body::from(json))
        .unwrap_or_default()
}
