//! # Gateway Test Utilities
//!
//! Shared test utilities for the API gateway.
//!
//! This crate provides:
//! - Server test harness (`TestGatewayServer`) with mock Auth and Todo
//!   services
//! - HS256 token builder (`TestTokenBuilder`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gateway_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestGatewayServer::spawn().await?;
//!     let token = TestTokenBuilder::new().for_user("u42").sign(TEST_JWT_SECRET);
//!
//!     let response = reqwest::Client::new()
//!         .get(format!("{}/todos", server.url()))
//!         .bearer_auth(token)
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod server_harness;
pub mod token_builders;

/// Shared HS256 secret used by the harness and the token builder.
pub const TEST_JWT_SECRET: &str = "test-gateway-jwt-secret";

// Re-export commonly used items
pub use server_harness::*;
pub use token_builders::*;
