//! Todo API Gateway Library
//!
//! Single entry point for the todo application. The gateway:
//!
//! - Forwards `/auth/*` to the Auth Service unchanged
//! - Verifies HS256 bearer tokens for `/todos/*`, injects the verified owner
//!   identifier as `x-user-id`, strips the prefix and forwards to the Todo
//!   Service
//! - Re-serializes JSON bodies of proxied writes
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> handlers/proxy.rs -> middleware/auth.rs -> proxy/*.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - Token claims and HS256 verification
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Authorization step and HTTP metrics
//! - `models` - Response models for operational endpoints
//! - `observability` - Prometheus metrics
//! - `proxy` - Route table, outbound request preparation, upstream client
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod proxy;
pub mod routes;
