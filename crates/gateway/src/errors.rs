//! Gateway error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl. Response
//! bodies are a flat `{"error": "..."}` object with a fixed, generic message
//! per variant. The detail carried by each variant is only ever logged.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Value of the `WWW-Authenticate` header sent with every 401 response.
pub const WWW_AUTHENTICATE_VALUE: &str = "Bearer realm=\"todo-gateway\"";

/// Gateway error type.
///
/// Maps to HTTP status codes:
/// - AuthenticationMissing, AuthenticationInvalid: 401 Unauthorized
/// - MalformedRequest, MalformedPath: 400 Bad Request
/// - PayloadTooLarge: 413 Payload Too Large
/// - UpstreamUnavailable: 502 Bad Gateway
/// - UpstreamTimeout: 504 Gateway Timeout
/// - Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Missing bearer token")]
    AuthenticationMissing,

    #[error("Invalid token: {0}")]
    AuthenticationInvalid(String),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Malformed path: {0}")]
    MalformedPath(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::AuthenticationMissing | GatewayError::AuthenticationInvalid(_) => {
                StatusCode::UNAUTHORIZED
            }
            GatewayError::MalformedRequest(_) | GatewayError::MalformedPath(_) => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Never includes the variant's detail.
    pub fn public_message(&self) -> &'static str {
        match self {
            GatewayError::AuthenticationMissing => "Unauthorized",
            GatewayError::AuthenticationInvalid(_) => "Invalid token",
            GatewayError::MalformedRequest(_) => "Malformed request body",
            GatewayError::MalformedPath(_) => "Malformed request path",
            GatewayError::PayloadTooLarge => "Request body too large",
            GatewayError::UpstreamUnavailable(_) => "Bad gateway",
            GatewayError::UpstreamTimeout(_) => "Gateway timeout",
            GatewayError::Internal(_) => "Internal server error",
        }
    }
}

/// Flat JSON error body: `{"error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match &self {
            GatewayError::MalformedRequest(reason) | GatewayError::MalformedPath(reason) => {
                tracing::debug!(target: "gateway.errors", reason = %reason, "Rejected malformed request");
            }
            GatewayError::UpstreamUnavailable(reason) | GatewayError::UpstreamTimeout(reason) => {
                tracing::warn!(target: "gateway.errors", reason = %reason, "Upstream request failed");
            }
            GatewayError::Internal(reason) => {
                tracing::error!(target: "gateway.errors", reason = %reason, "Internal gateway error");
            }
            // Authentication failures are logged where they are detected
            _ => {}
        }

        let status = self.status_code();
        let mut response = (
            status,
            Json(ErrorResponse {
                error: self.public_message(),
            }),
        )
            .into_response();

        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) = WWW_AUTHENTICATE_VALUE.parse() {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}
