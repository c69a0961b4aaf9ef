//! Builder for signed test tokens.
//!
//! Produces HS256 tokens in the shape the Auth Service issues:
//! `{"userId": ..., "iat": ..., "exp": ...}`.

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Map, Value};

/// Builder for creating signed test JWTs
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_user("u42")
///     .expires_in(3600)
///     .sign(TEST_JWT_SECRET);
/// ```
pub struct TestTokenBuilder {
    user_id: Option<String>,
    exp: Option<i64>,
    iat: Option<i64>,
    algorithm: Algorithm,
}

impl TestTokenBuilder {
    /// Create a new token builder: user `test-user`, valid for an hour.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            user_id: Some("test-user".to_string()),
            exp: Some((now + Duration::seconds(3600)).timestamp()),
            iat: Some(now.timestamp()),
            algorithm: Algorithm::HS256,
        }
    }

    /// Set the `userId` claim
    pub fn for_user(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    /// Omit the `userId` claim
    pub fn without_user(mut self) -> Self {
        self.user_id = None;
        self
    }

    /// Set expiration in seconds from now (negative for the past)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = Some((Utc::now() + Duration::seconds(seconds)).timestamp());
        self
    }

    /// Expired one minute ago
    pub fn expired(self) -> Self {
        self.expires_in(-60)
    }

    /// Omit the `exp` claim
    pub fn without_exp(mut self) -> Self {
        self.exp = None;
        self
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = Some(timestamp);
        self
    }

    /// Omit the `iat` claim
    pub fn without_iat(mut self) -> Self {
        self.iat = None;
        self
    }

    /// Sign with a different HMAC algorithm
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Build the claims as a JSON value
    pub fn build(&self) -> Value {
        let mut claims = Map::new();
        if let Some(user_id) = &self.user_id {
            claims.insert("userId".to_string(), json!(user_id));
        }
        if let Some(iat) = self.iat {
            claims.insert("iat".to_string(), json!(iat));
        }
        if let Some(exp) = self.exp {
            claims.insert("exp".to_string(), json!(exp));
        }
        Value::Object(claims)
    }

    /// Sign the claims with `secret`
    pub fn sign(self, secret: &str) -> String {
        encode(
            &Header::new(self.algorithm),
            &self.build(),
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("HMAC signing should not fail")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
