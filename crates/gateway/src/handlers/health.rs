//! Health check handlers.
//!
//! - `/health`: Liveness probe - returns OK if the process is running
//! - `/ready`: Readiness probe - checks that routing and token verification
//!   are configured. Upstreams are not contacted.

use crate::models::ReadinessResponse;
use crate::proxy::Upstream;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

/// Liveness probe handler.
///
/// Does not check any dependencies.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
///
/// Returns 200 if the gateway can route and verify tokens, 503 otherwise.
/// Failure details are logged server-side only.
#[tracing::instrument(skip_all, name = "gateway.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rules = state.route_table.rules();
    let upstreams_configured = [Upstream::AuthService, Upstream::TodoService]
        .iter()
        .all(|upstream| {
            rules
                .iter()
                .any(|rule| rule.upstream == *upstream && !rule.base_url.is_empty())
        });

    if !upstreams_configured {
        tracing::warn!(target: "gateway.health", "Readiness check failed: upstream routes not configured");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "not_ready",
                upstreams: Some("unconfigured"),
                token_verification: None,
                error: Some("Service dependencies unavailable".to_string()),
            }),
        );
    }

    if !state.config.has_jwt_secret() {
        tracing::warn!(target: "gateway.health", "Readiness check failed: JWT secret not configured");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "not_ready",
                upstreams: Some("configured"),
                token_verification: Some("unconfigured"),
                error: Some("Service dependencies unavailable".to_string()),
            }),
        );
    }

    (
        StatusCode::OK,
        Json(ReadinessResponse {
            status: "ready",
            upstreams: Some("configured"),
            token_verification: Some("configured"),
            error: None,
        }),
    )
}
