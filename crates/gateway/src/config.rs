//! Gateway configuration.
//!
//! Configuration is loaded from environment variables once at startup and is
//! immutable afterwards. The JWT secret is held as a `SecretString` and is
//! redacted in Debug output.

use axum::http::HeaderValue;
use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use common::secret::{ExposeSecret, SecretString};
use reqwest::Url;
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default listen port.
pub const DEFAULT_GATEWAY_PORT: u16 = 3000;

/// Default timeout for a single upstream request in seconds.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECONDS: u64 = 30;

/// Default maximum buffered request body (100 KiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 100 * 1024;

/// Default graceful shutdown drain period in seconds.
pub const DEFAULT_DRAIN_SECONDS: u64 = 30;

/// Gateway configuration.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:3000").
    pub bind_address: String,

    /// Auth Service base URL, without trailing slash.
    pub auth_service_url: String,

    /// Todo Service base URL, without trailing slash.
    pub todo_service_url: String,

    /// Shared HS256 signing secret.
    pub jwt_secret: SecretString,

    /// Origin allowed to make credentialed cross-origin requests.
    /// `None` allows any origin without credentials.
    pub allowed_origin: Option<String>,

    /// JWT clock skew tolerance in seconds for iat validation.
    pub jwt_clock_skew_seconds: i64,

    /// Timeout for a single upstream request in seconds.
    pub upstream_timeout_seconds: u64,

    /// Maximum request body size buffered for forwarding.
    pub max_body_bytes: usize,

    /// Graceful shutdown drain period in seconds.
    pub drain_seconds: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("auth_service_url", &self.auth_service_url)
            .field("todo_service_url", &self.todo_service_url)
            .field("jwt_secret", &"[REDACTED]")
            .field("allowed_origin", &self.allowed_origin)
            .field("jwt_clock_skew_seconds", &self.jwt_clock_skew_seconds)
            .field("upstream_timeout_seconds", &self.upstream_timeout_seconds)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("drain_seconds", &self.drain_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid port configuration: {0}")]
    InvalidPort(String),

    #[error("Invalid upstream URL: {0}")]
    InvalidUpstreamUrl(String),

    #[error("Invalid allowed origin: {0}")]
    InvalidOrigin(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid upstream timeout configuration: {0}")]
    InvalidUpstreamTimeout(String),

    #[error("Invalid max body size configuration: {0}")]
    InvalidMaxBodyBytes(String),

    #[error("Invalid drain period configuration: {0}")]
    InvalidDrainSeconds(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = match vars.get("BIND_ADDRESS") {
            Some(address) => address.clone(),
            None => {
                let port = if let Some(value_str) = vars.get("GATEWAY_PORT") {
                    value_str.parse::<u16>().map_err(|e| {
                        ConfigError::InvalidPort(format!(
                            "GATEWAY_PORT must be a valid port number, got '{}': {}",
                            value_str, e
                        ))
                    })?
                } else {
                    DEFAULT_GATEWAY_PORT
                };
                format!("0.0.0.0:{}", port)
            }
        };

        let auth_service_url = parse_upstream_url(vars, "AUTH_SERVICE_URL")?;
        let todo_service_url = parse_upstream_url(vars, "TODO_SERVICE_URL")?;

        let jwt_secret = vars
            .get("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .map(|s| SecretString::from(s.clone()))
            .ok_or_else(|| ConfigError::MissingEnvVar("JWT_SECRET".to_string()))?;

        let allowed_origin = match vars.get("ORIGIN_URL").map(|s| s.trim()) {
            None | Some("") => None,
            Some(origin) => {
                let origin = origin.trim_end_matches('/');
                HeaderValue::from_str(origin).map_err(|e| {
                    ConfigError::InvalidOrigin(format!(
                        "ORIGIN_URL must be a valid header value, got '{}': {}",
                        origin, e
                    ))
                })?;
                Some(origin.to_string())
            }
        };

        // Parse JWT clock skew tolerance with validation
        let jwt_clock_skew_seconds = if let Some(value_str) = vars.get("JWT_CLOCK_SKEW_SECONDS") {
            let value: i64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value <= 0 {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be positive, got {}",
                    value
                )));
            }

            if value > MAX_CLOCK_SKEW.as_secs() as i64 {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must not exceed {} seconds, got {}",
                    MAX_CLOCK_SKEW.as_secs(),
                    value
                )));
            }

            value
        } else {
            DEFAULT_CLOCK_SKEW.as_secs() as i64
        };

        let upstream_timeout_seconds =
            if let Some(value_str) = vars.get("UPSTREAM_TIMEOUT_SECONDS") {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidUpstreamTimeout(format!(
                        "UPSTREAM_TIMEOUT_SECONDS must be a valid positive integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value == 0 {
                    return Err(ConfigError::InvalidUpstreamTimeout(
                        "UPSTREAM_TIMEOUT_SECONDS must be greater than 0".to_string(),
                    ));
                }

                value
            } else {
                DEFAULT_UPSTREAM_TIMEOUT_SECONDS
            };

        let max_body_bytes = if let Some(value_str) = vars.get("MAX_BODY_BYTES") {
            let value: usize = value_str.parse().map_err(|e| {
                ConfigError::InvalidMaxBodyBytes(format!(
                    "MAX_BODY_BYTES must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidMaxBodyBytes(
                    "MAX_BODY_BYTES must be greater than 0".to_string(),
                ));
            }

            value
        } else {
            DEFAULT_MAX_BODY_BYTES
        };

        let drain_seconds = if let Some(value_str) = vars.get("GATEWAY_DRAIN_SECONDS") {
            value_str.parse::<u64>().map_err(|e| {
                ConfigError::InvalidDrainSeconds(format!(
                    "GATEWAY_DRAIN_SECONDS must be a valid non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?
        } else {
            DEFAULT_DRAIN_SECONDS
        };

        Ok(Config {
            bind_address,
            auth_service_url,
            todo_service_url,
            jwt_secret,
            allowed_origin,
            jwt_clock_skew_seconds,
            upstream_timeout_seconds,
            max_body_bytes,
            drain_seconds,
        })
    }

    /// Whether the configured secret is usable for HS256 verification.
    pub fn has_jwt_secret(&self) -> bool {
        !self.jwt_secret.expose_secret().is_empty()
    }
}

/// Read and normalize an upstream base URL.
///
/// Only absolute http(s) URLs are accepted. Trailing slashes are removed so
/// that rewritten paths can be appended directly.
fn parse_upstream_url(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    let raw = vars
        .get(name)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))?;

    let url = Url::parse(raw).map_err(|e| {
        ConfigError::InvalidUpstreamUrl(format!("{} must be an absolute URL, got '{}': {}", name, raw, e))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUpstreamUrl(format!(
            "{} must use http or https, got '{}'",
            name,
            url.scheme()
        )));
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::InvalidUpstreamUrl(format!(
            "{} must not contain a query or fragment",
            name
        )));
    }

    Ok(raw.trim_end_matches('/').to_string())
}
