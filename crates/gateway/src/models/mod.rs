//! Response models for the gateway's own endpoints.
//!
//! Proxied responses are relayed untouched and have no model here.

use serde::Serialize;

/// Readiness probe response.
///
/// Returned by `/ready`.
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    /// "ready" or "not_ready".
    pub status: &'static str,

    /// Whether both upstream base URLs are configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstreams: Option<&'static str>,

    /// Whether a token verification secret is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_verification: Option<&'static str>,

    /// Error message (generic, no configuration details).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
