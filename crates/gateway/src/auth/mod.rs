//! Token verification for the gateway.
//!
//! # Components
//!
//! - `claims` - JWT claims issued by the auth service and the per-request
//!   identity derived from them
//! - `jwt` - HS256 verification against the shared secret

pub mod claims;
pub mod jwt;

pub use claims::{AuthenticatedIdentity, UserClaims};
pub use jwt::JwtValidator;
