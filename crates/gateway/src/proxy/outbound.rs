//! Outbound request preparation.
//!
//! Turns an inbound request (already authorized, body already buffered) into
//! the exact request sent upstream. All header and body rewriting happens
//! here, before any bytes leave the gateway.

use crate::auth::AuthenticatedIdentity;
use crate::errors::GatewayError;
use crate::proxy::route_table::RouteRule;
use axum::http::{
    header::{AUTHORIZATION, CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, HOST},
    request::Parts,
    HeaderMap, HeaderName, HeaderValue, Method,
};
use bytes::Bytes;

/// Trusted owner header consumed by the Todo Service.
pub const USER_ID_HEADER: &str = "x-user-id";

/// A fully prepared upstream request.
#[derive(Debug)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl OutboundRequest {
    /// Build the upstream request for `rule`.
    ///
    /// - Path is rewritten per the rule; the query string is kept.
    /// - Hop-by-hop headers, `Host` and `Content-Length` are dropped. The
    ///   HTTP client derives `Host` from the upstream URL.
    /// - On identity-injecting rules `Authorization` is dropped, `x-user-id`
    ///   is replaced with the verified identity, and write bodies are
    ///   re-serialized as JSON.
    ///
    /// # Errors
    ///
    /// - `MalformedRequest` - write body is not a JSON object or array
    /// - `Internal` - identity-injecting rule reached without an identity
    pub fn prepare(
        rule: &RouteRule,
        identity: Option<&AuthenticatedIdentity>,
        parts: &Parts,
        body: Bytes,
    ) -> Result<Self, GatewayError> {
        let method = parts.method.clone();
        let url = rule.target_url(parts.uri.path(), parts.uri.query());
        let mut headers = forwardable_headers(&parts.headers);

        let body = if rule.inject_identity {
            let identity = identity.ok_or_else(|| {
                GatewayError::Internal(format!(
                    "route {} injects identity but request was not authorized",
                    rule.prefix
                ))
            })?;

            headers.remove(AUTHORIZATION);
            let user_id = HeaderValue::from_str(identity.user_id()).map_err(|e| {
                GatewayError::Internal(format!("verified user id is not a header value: {e}"))
            })?;
            headers.insert(HeaderName::from_static(USER_ID_HEADER), user_id);

            if is_write_method(&method) {
                let serialized = reserialize_json_body(&body)?;
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                headers.insert(CONTENT_LENGTH, HeaderValue::from(serialized.len()));
                serialized
            } else {
                body
            }
        } else {
            body
        };

        Ok(Self {
            method,
            url,
            headers,
            body,
        })
    }
}

/// Methods whose bodies are re-serialized on identity-injecting routes.
pub fn is_write_method(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Parse a write body as JSON and serialize it again.
///
/// An empty body becomes `{}`. Only objects and arrays are accepted at the
/// top level. Key order is preserved.
///
/// # Errors
///
/// Returns `GatewayError::MalformedRequest` if the body is not valid JSON or
/// its top-level value is a scalar.
pub fn reserialize_json_body(body: &[u8]) -> Result<Bytes, GatewayError> {
    if body.is_empty() {
        return Ok(Bytes::from_static(b"{}"));
    }

    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| GatewayError::MalformedRequest(format!("invalid JSON body: {e}")))?;

    if !(value.is_object() || value.is_array()) {
        return Err(GatewayError::MalformedRequest(
            "JSON body must be an object or array".to_string(),
        ));
    }

    serde_json::to_vec(&value)
        .map(Bytes::from)
        .map_err(|e| GatewayError::Internal(format!("failed to serialize JSON body: {e}")))
}

/// Hop-by-hop headers (RFC 7230 section 6.1) that must not be forwarded.
pub fn is_hop_by_hop_header(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "proxy-connection"
            | "te"
            | "trailer"
            | "trailers"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Copy headers that may cross the proxy, in either direction.
///
/// Drops hop-by-hop headers, any header named in `Connection`, plus `Host`
/// and `Content-Length`.
pub fn forwardable_headers(source: &HeaderMap) -> HeaderMap {
    let connection_listed: Vec<String> = source
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect();

    let mut headers = HeaderMap::with_capacity(source.len());
    for (name, value) in source {
        if *name == HOST
            || *name == CONTENT_LENGTH
            || is_hop_by_hop_header(name.as_str())
            || connection_listed.iter().any(|t| t == name.as_str())
        {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}
