//! Middleware for the gateway.
//!
//! # Components
//!
//! - `auth` - Bearer token extraction and the per-request authorization step
//! - `http_metrics` - HTTP request metrics captured for every response

pub mod auth;
pub mod http_metrics;

pub use auth::{authorize, extract_bearer_token};
pub use http_metrics::http_metrics_middleware;
