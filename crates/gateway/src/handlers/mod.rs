//! HTTP request handlers for the gateway.

pub mod health;
pub mod metrics;
pub mod proxy;
pub mod welcome;

pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;
pub use proxy::dispatch;
pub use welcome::{welcome, WELCOME_MESSAGE};
