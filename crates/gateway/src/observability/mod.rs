//! Observability for the gateway.
//!
//! Provides metric definitions and recording helpers. HTTP-level capture
//! lives in `crate::middleware::http_metrics`.

pub mod metrics;
