//! Authorization step for protected routes.
//!
//! The dispatcher calls [`authorize`] for routes that require a token. The
//! verified identity is returned to the caller rather than stashed in the
//! request, so the only path from a token to the `x-user-id` header is an
//! explicit value.

use crate::auth::{AuthenticatedIdentity, JwtValidator};
use crate::errors::GatewayError;
use crate::observability::metrics::record_token_validation;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use tracing::instrument;

/// Extract the Bearer token from the Authorization header.
///
/// # Errors
///
/// Returns `GatewayError::AuthenticationMissing` if the header is absent,
/// not visible ASCII, uses a scheme other than `Bearer` (compared
/// case-insensitively), or carries a blank token.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, GatewayError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!(target: "gateway.middleware.auth", "Missing Authorization header");
            GatewayError::AuthenticationMissing
        })?;

    // Auth scheme names are case-insensitive
    let token = auth_header
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token)
        .ok_or_else(|| {
            tracing::debug!(target: "gateway.middleware.auth", "Invalid Authorization header format");
            GatewayError::AuthenticationMissing
        })?;

    let token = token.trim();
    if token.is_empty() {
        tracing::debug!(target: "gateway.middleware.auth", "Empty bearer token");
        return Err(GatewayError::AuthenticationMissing);
    }

    Ok(token)
}

/// Verify the request's bearer token and return the caller's identity.
///
/// # Errors
///
/// - `AuthenticationMissing` - no usable bearer token
/// - `AuthenticationInvalid` - token failed verification
#[instrument(skip_all, name = "gateway.middleware.auth")]
pub fn authorize(
    validator: &JwtValidator,
    headers: &HeaderMap,
) -> Result<AuthenticatedIdentity, GatewayError> {
    let token = extract_bearer_token(headers).inspect_err(|_| {
        record_token_validation("error", Some("missing"));
    })?;

    validator.validate(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Utc;
    use common::secret::SecretString;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "middleware-test-secret";

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn valid_token(user_id: &str) -> String {
        let now = Utc::now().timestamp();
        encode(
            &Header::default(),
            &json!({"userId": user_id, "iat": now, "exp": now + 3600}),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_extract_bearer_token_success() {
        let headers = headers_with_auth("Bearer abc.def.ghi");
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_extract_bearer_token_scheme_is_case_insensitive() {
        for value in ["bearer abc.def.ghi", "BEARER abc.def.ghi", "BeArEr abc.def.ghi"] {
            let headers = headers_with_auth(value);
            assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def.ghi");
        }
    }

    #[test]
    fn test_extract_bearer_token_missing_header() {
        let headers = HeaderMap::new();
        let result = extract_bearer_token(&headers);
        assert!(matches!(result, Err(GatewayError::AuthenticationMissing)));
    }

    #[test]
    fn test_extract_bearer_token_wrong_scheme() {
        for value in ["Basic dXNlcjpwYXNz", "Bearerabc.def.ghi", "Bearer"] {
            let headers = headers_with_auth(value);
            assert!(matches!(
                extract_bearer_token(&headers),
                Err(GatewayError::AuthenticationMissing)
            ));
        }
    }

    #[test]
    fn test_extract_bearer_token_blank() {
        for value in ["Bearer ", "Bearer    "] {
            let headers = headers_with_auth(value);
            assert!(matches!(
                extract_bearer_token(&headers),
                Err(GatewayError::AuthenticationMissing)
            ));
        }
    }

    #[test]
    fn test_extract_bearer_token_non_ascii_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_bytes("Bearer tök".as_bytes()).unwrap(),
        );
        assert!(matches!(
            extract_bearer_token(&headers),
            Err(GatewayError::AuthenticationMissing)
        ));
    }

    #[test]
    fn test_authorize_returns_identity() {
        let validator = JwtValidator::new(&SecretString::from(SECRET), 300);
        let headers = headers_with_auth(&format!("Bearer {}", valid_token("u42")));

        let identity = authorize(&validator, &headers).unwrap();
        assert_eq!(identity.user_id(), "u42");
    }

    #[test]
    fn test_authorize_missing_token() {
        let validator = JwtValidator::new(&SecretString::from(SECRET), 300);

        let result = authorize(&validator, &HeaderMap::new());
        assert!(matches!(result, Err(GatewayError::AuthenticationMissing)));
    }

    #[test]
    fn test_authorize_invalid_token() {
        let validator = JwtValidator::new(&SecretString::from(SECRET), 300);
        let headers = headers_with_auth("Bearer not.a.token");

        let result = authorize(&validator, &headers);
        assert!(matches!(
            result,
            Err(GatewayError::AuthenticationInvalid(_))
        ));
    }
}
