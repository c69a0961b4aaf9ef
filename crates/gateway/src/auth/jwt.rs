//! JWT validation for the gateway.
//!
//! Validates bearer tokens issued by the auth service with the shared HS256
//! secret.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - Only HS256 is accepted
//! - `exp` is required and enforced with zero leeway
//! - `iat`, when present, may not be further in the future than the clock skew
//! - Clients only ever see a generic "Invalid token" message

use crate::auth::claims::{AuthenticatedIdentity, UserClaims};
use crate::errors::GatewayError;
use crate::observability::metrics::record_token_validation;
use axum::http::HeaderValue;
use common::jwt::{extract_alg, validate_iat};
use common::secret::{ExposeSecret, SecretString};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::time::Duration;
use tracing::instrument;

/// The only algorithm the auth service signs with.
const EXPECTED_ALG: &str = "HS256";

/// HS256 validator built once from configuration.
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
    clock_skew: Duration,
}

impl JwtValidator {
    /// Create a new validator.
    ///
    /// # Arguments
    ///
    /// * `secret` - Shared HS256 secret
    /// * `clock_skew_seconds` - Tolerance for `iat` values in the future
    pub fn new(secret: &SecretString, clock_skew_seconds: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        // The auth service does not issue audiences
        validation.validate_aud = false;

        Self {
            decoding_key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
            clock_skew: Duration::from_secs(clock_skew_seconds.max(0).unsigned_abs()),
        }
    }

    /// Validate a bearer token and return the verified identity.
    ///
    /// # Checks
    ///
    /// 1. Size and structure (via `common::jwt::extract_alg`)
    /// 2. Header algorithm is HS256
    /// 3. Signature, `exp`, and claim shape
    /// 4. `iat` within clock skew
    /// 5. `userId` is non-empty and usable as a header value
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::AuthenticationInvalid` carrying a short reason
    /// label. The reason is logged and counted; it is never sent to clients.
    #[instrument(skip_all, name = "gateway.auth.validate")]
    pub fn validate(&self, token: &str) -> Result<AuthenticatedIdentity, GatewayError> {
        match self.verify(token) {
            Ok(identity) => {
                record_token_validation("success", None);
                tracing::debug!(target: "gateway.auth.jwt", "Token validated successfully");
                Ok(identity)
            }
            Err(reason) => {
                record_token_validation("error", Some(reason));
                tracing::warn!(target: "gateway.auth.jwt", reason = reason, "JWT verification failed");
                Err(GatewayError::AuthenticationInvalid(reason.to_string()))
            }
        }
    }

    fn verify(&self, token: &str) -> Result<AuthenticatedIdentity, &'static str> {
        let alg = extract_alg(token).map_err(|e| e.reason())?;
        if alg != EXPECTED_ALG {
            tracing::debug!(target: "gateway.auth.jwt", alg = %alg, "Unexpected token algorithm");
            return Err("unexpected_alg");
        }

        let token_data = decode::<UserClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(target: "gateway.auth.jwt", error = %e, "Token decode failed");
                decode_error_reason(e.kind())
            })?;
        let claims = token_data.claims;

        if let Some(iat) = claims.iat {
            validate_iat(iat, self.clock_skew).map_err(|e| e.reason())?;
        }

        if claims.user_id.trim().is_empty() || HeaderValue::from_str(&claims.user_id).is_err() {
            return Err("invalid_user_id");
        }

        Ok(AuthenticatedIdentity::from(claims))
    }
}

/// Map a `jsonwebtoken` error to a bounded reason label.
fn decode_error_reason(kind: &ErrorKind) -> &'static str {
    match kind {
        ErrorKind::ExpiredSignature => "expired",
        ErrorKind::InvalidSignature => "bad_signature",
        ErrorKind::InvalidAlgorithm => "unexpected_alg",
        ErrorKind::MissingRequiredClaim(_) => "missing_claim",
        ErrorKind::ImmatureSignature => "not_yet_valid",
        ErrorKind::Json(_) => "invalid_claims",
        _ => "malformed",
    }
}
