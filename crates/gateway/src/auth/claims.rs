//! JWT claims and the request-scoped identity derived from them.
//!
//! The owner identifier is redacted in Debug output for both types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Claims carried by tokens issued by the auth service.
#[derive(Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// Owner identifier of the authenticated user - redacted in Debug output.
    #[serde(rename = "userId")]
    pub user_id: String,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl fmt::Debug for UserClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserClaims")
            .field("user_id", &"[REDACTED]")
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .finish()
    }
}

/// Verified identity for a single in-flight request.
///
/// Produced only by [`crate::auth::JwtValidator`] and passed by value from
/// the authorization step to the dispatch step. Never stored.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    user_id: String,
    expires_at: i64,
}

impl AuthenticatedIdentity {
    /// Owner identifier to forward in the trusted `x-user-id` header.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Token expiry (Unix epoch seconds).
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }
}

impl From<UserClaims> for AuthenticatedIdentity {
    fn from(claims: UserClaims) -> Self {
        Self {
            user_id: claims.user_id,
            expires_at: claims.exp,
        }
    }
}

impl fmt::Debug for AuthenticatedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedIdentity")
            .field("user_id", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
