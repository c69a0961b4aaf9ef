//! Prometheus metrics endpoint handler.
//!
//! `/metrics` is unauthenticated. Labels are bounded and carry no owner
//! identifiers or token material.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /metrics
///
/// Returns Prometheus text format:
/// ```text
/// # TYPE gateway_http_requests_total counter
/// gateway_http_requests_total{method="GET",endpoint="/todos",status_code="200"} 42
/// ```
#[tracing::instrument(skip_all, name = "gateway.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}

// The endpoint needs a PrometheusHandle; it is exercised end to end in
// tests/health_tests.rs.
