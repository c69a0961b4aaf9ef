//! HTTP routes for the gateway.
//!
//! Defines the Axum router and application state.

use crate::auth::JwtValidator;
use crate::config::Config;
use crate::errors::GatewayError;
use crate::handlers;
use crate::middleware::http_metrics_middleware;
use crate::proxy::{RouteTable, UpstreamClient};
use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowHeaders, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Grace added on top of the upstream timeout for the whole-request timeout,
/// so that upstream timeouts surface as 504 rather than 408.
const REQUEST_TIMEOUT_GRACE: Duration = Duration::from_secs(5);

/// Application state shared across all handlers. Built once at startup and
/// never mutated.
pub struct AppState {
    pub config: Config,
    pub route_table: RouteTable,
    pub jwt_validator: JwtValidator,
    pub upstream_client: UpstreamClient,
}

impl AppState {
    /// Build state from configuration.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Internal` if the upstream HTTP client cannot be
    /// built.
    pub fn new(config: Config) -> Result<Self, GatewayError> {
        let route_table = RouteTable::from_config(&config);
        let jwt_validator = JwtValidator::new(&config.jwt_secret, config.jwt_clock_skew_seconds);
        let upstream_client =
            UpstreamClient::new(Duration::from_secs(config.upstream_timeout_seconds))?;

        Ok(Self {
            config,
            route_table,
            jwt_validator,
            upstream_client,
        })
    }
}

/// Build the application routes.
///
/// - `/` - Welcome text
/// - `/health` - Liveness probe
/// - `/ready` - Readiness probe
/// - `/metrics` - Prometheus metrics
/// - everything else - proxy dispatch (`/auth/*`, `/todos/*`, or welcome)
///
/// Layers, innermost first: trace, request timeout, CORS, HTTP metrics.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let request_timeout =
        Duration::from_secs(state.config.upstream_timeout_seconds) + REQUEST_TIMEOUT_GRACE;
    let cors = cors_layer(&state.config);

    let gateway_routes = Router::new()
        .route("/", get(handlers::welcome))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .fallback(handlers::dispatch)
        .with_state(state);

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    gateway_routes
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        // Outermost, so 401s, upstream failures and CORS preflights are counted
        .layer(middleware::from_fn(http_metrics_middleware))
}

/// CORS policy.
///
/// With an allowed origin configured, only that origin is accepted and
/// credentials are allowed. Without one, any origin is accepted without
/// credentials.
pub fn cors_layer(config: &Config) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::HEAD,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
    ];

    let allowed_origin = config
        .allowed_origin
        .as_deref()
        .and_then(|origin| HeaderValue::from_str(origin).ok());

    match allowed_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(methods)
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any),
    }
}
