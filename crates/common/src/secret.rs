//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports [`secrecy`] types. `SecretString` implements `Debug` with
//! redaction, so any struct deriving `Debug` that holds one is safe to log.
//! The value is zeroized on drop.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct SigningConfig {
//!     issuer: String,
//!     jwt_secret: SecretString,
//! }
//!
//! let config = SigningConfig {
//!     issuer: "auth-service".to_string(),
//!     jwt_secret: SecretString::from("shared-hmac-secret"),
//! };
//!
//! // Safe: the secret is redacted
//! println!("{:?}", config);
//!
//! // Access requires an explicit call
//! let raw: &str = config.jwt_secret.expose_secret();
//! ```
//!
//! Use `SecretString` for the JWT signing secret and for bearer tokens that
//! need to be held beyond a single function call.

pub use secrecy::{ExposeSecret, SecretBox, SecretString};
