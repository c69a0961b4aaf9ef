//! Metric definitions for the gateway.
//!
//! All metrics follow Prometheus naming conventions:
//! - `gateway_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `method`: HTTP methods only
//! - `endpoint`: fixed set of normalized paths (see [`normalize_endpoint`])
//! - `status`: success, error, timeout
//! - `upstream`: auth, todo
//! - `error_type`: bounded reason labels from the JWT validator

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the Prometheus recorder and return its handle for `/metrics`.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("gateway_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Upstream calls share the client timeout ceiling
        .set_buckets_for_metric(
            Matcher::Prefix("gateway_upstream_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000,
                30.000,
            ],
        )
        .map_err(|e| format!("Failed to set upstream request buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record inbound HTTP request completion.
///
/// Metric: `gateway_http_requests_total`, `gateway_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status` / `status_code`
///
/// Captures every response, including 401s produced before dispatch and
/// 405s produced by the router.
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("gateway_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("gateway_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=399 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize a request path to a bounded label value.
///
/// Todo item paths collapse to `/todos/{id}`; anything unrecognized becomes
/// `/other`.
pub(crate) fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/health" => "/health",
        "/ready" => "/ready",
        "/metrics" => "/metrics",
        "/auth/login" => "/auth/login",
        "/auth/register" => "/auth/register",
        "/todos" | "/todos/" => "/todos",
        _ => normalize_dynamic_endpoint(path),
    }
}

fn normalize_dynamic_endpoint(path: &str) -> &'static str {
    if let Some(rest) = path.strip_prefix("/todos/") {
        let id = rest.trim_end_matches('/');
        if !id.is_empty() && !id.contains('/') {
            return "/todos/{id}";
        }
    }

    "/other"
}

// ============================================================================
// Token Validation Metrics
// ============================================================================

/// Record a bearer token validation outcome.
///
/// Metric: `gateway_token_validations_total`
/// Labels: `status`, `error_type`
///
/// # Arguments
///
/// * `status` - "success" or "error"
/// * `error_type` - Reason label for failures (e.g., "expired", "bad_signature")
pub fn record_token_validation(status: &str, error_type: Option<&str>) {
    counter!("gateway_token_validations_total",
        "status" => status.to_string(),
        "error_type" => error_type.unwrap_or("none").to_string()
    )
    .increment(1);
}

// ============================================================================
// Upstream Metrics
// ============================================================================

/// Record a forwarded upstream request.
///
/// Metric: `gateway_upstream_requests_total`, `gateway_upstream_request_duration_seconds`
/// Labels: `upstream`, `status`
///
/// Status values: "success" (any upstream response, including 4xx/5xx),
/// "error" (unreachable), "timeout"
pub fn record_upstream_request(upstream: &str, status: &str, duration: Duration) {
    histogram!("gateway_upstream_request_duration_seconds",
        "upstream" => upstream.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("gateway_upstream_requests_total",
        "upstream" => upstream.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
