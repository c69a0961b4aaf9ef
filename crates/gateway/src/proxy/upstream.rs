//! Upstream HTTP client.
//!
//! One pooled `reqwest::Client` is shared by all requests. Redirects are
//! relayed to the caller rather than followed. There is no retry: a failed
//! upstream call ends the request with 502 or 504.

use crate::errors::GatewayError;
use crate::observability::metrics::record_upstream_request;
use crate::proxy::outbound::{forwardable_headers, OutboundRequest};
use crate::proxy::route_table::Upstream;
use axum::{
    body::Body,
    http::{header::CONTENT_LENGTH, Method},
    response::Response,
};
use std::time::{Duration, Instant};
use tracing::instrument;

pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    /// Create a client with a per-request timeout covering connect, send and
    /// the full response body.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Internal` if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .redirect(reqwest::redirect::Policy::none())
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| GatewayError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Send `outbound` and relay the upstream response.
    ///
    /// Status, headers (minus hop-by-hop) and body are passed through as-is,
    /// including 4xx/5xx responses. For `HEAD` the upstream `Content-Length`
    /// is kept, since there is no body to derive it from.
    ///
    /// # Errors
    ///
    /// - `UpstreamTimeout` - no complete response within the timeout
    /// - `UpstreamUnavailable` - connection or transport failure
    #[instrument(skip_all, name = "gateway.proxy.forward", fields(upstream = upstream.label()))]
    pub async fn forward(
        &self,
        upstream: Upstream,
        outbound: OutboundRequest,
    ) -> Result<Response, GatewayError> {
        let start = Instant::now();
        let label = upstream.label();

        tracing::debug!(
            target: "gateway.proxy.upstream",
            method = %outbound.method,
            upstream = label,
            body_bytes = outbound.body.len(),
            "Forwarding request"
        );

        let is_head = outbound.method == Method::HEAD;
        let mut request = self
            .client
            .request(outbound.method, &outbound.url)
            .headers(outbound.headers);
        if !outbound.body.is_empty() {
            request = request.body(outbound.body);
        }

        let result = match request.send().await {
            Ok(response) => relay(response, is_head).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(response) => {
                record_upstream_request(label, "success", start.elapsed());
                tracing::debug!(
                    target: "gateway.proxy.upstream",
                    upstream = label,
                    status = response.status().as_u16(),
                    "Upstream responded"
                );
                Ok(response)
            }
            Err(e) if e.is_timeout() => {
                record_upstream_request(label, "timeout", start.elapsed());
                Err(GatewayError::UpstreamTimeout(format!("{label}: {e}")))
            }
            Err(e) => {
                record_upstream_request(label, "error", start.elapsed());
                Err(GatewayError::UpstreamUnavailable(format!("{label}: {e}")))
            }
        }
    }
}

/// Convert a `reqwest` response into an axum response, buffering the body.
async fn relay(response: reqwest::Response, is_head: bool) -> Result<Response, reqwest::Error> {
    let status = response.status();
    let mut headers = forwardable_headers(response.headers());
    if is_head {
        if let Some(length) = response.headers().get(CONTENT_LENGTH) {
            headers.insert(CONTENT_LENGTH, length.clone());
        }
    }
    let body = response.bytes().await?;

    let mut relayed = Response::new(Body::from(body));
    *relayed.status_mut() = status;
    *relayed.headers_mut() = headers;
    Ok(relayed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use bytes::Bytes;
    use http_body_util::BodyExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn outbound(method: Method, url: String) -> OutboundRequest {
        OutboundRequest {
            method,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    #[tokio::test]
    async fn test_forward_relays_status_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/42"))
            .respond_with(
                ResponseTemplate::new(404)
                    .insert_header("x-upstream", "todo")
                    .set_body_string("Todo not found"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = UpstreamClient::new(Duration::from_secs(5)).unwrap();
        let response = client
            .forward(
                Upstream::TodoService,
                outbound(Method::GET, format!("{}/42", server.uri())),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["x-upstream"], "todo");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from_static(b"Todo not found"));
    }

    #[tokio::test]
    async fn test_forward_does_not_follow_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/sso"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/auth/login"))
            .mount(&server)
            .await;

        let client = UpstreamClient::new(Duration::from_secs(5)).unwrap();
        let response = client
            .forward(
                Upstream::AuthService,
                outbound(Method::GET, format!("{}/auth/sso", server.uri())),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()["location"], "/auth/login");
    }

    #[tokio::test]
    async fn test_forward_head_keeps_upstream_content_length() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/42"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-length", "5")
                    .set_body_string("hello"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = UpstreamClient::new(Duration::from_secs(5)).unwrap();
        let response = client
            .forward(
                Upstream::TodoService,
                outbound(Method::HEAD, format!("{}/42", server.uri())),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_LENGTH], "5");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_forward_get_drops_upstream_content_length() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;

        let client = UpstreamClient::new(Duration::from_secs(5)).unwrap();
        let response = client
            .forward(
                Upstream::TodoService,
                outbound(Method::GET, format!("{}/", server.uri())),
            )
            .await
            .unwrap();

        // Recomputed by the server from the relayed body
        assert!(!response.headers().contains_key(CONTENT_LENGTH));
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_forward_unreachable_is_bad_gateway() {
        let client = UpstreamClient::new(Duration::from_secs(5)).unwrap();

        let result = client
            .forward(
                Upstream::TodoService,
                outbound(Method::GET, "http://127.0.0.1:1/".to_string()),
            )
            .await;

        assert!(matches!(result, Err(GatewayError::UpstreamUnavailable(_))));
    }

    #[tokio::test]
    async fn test_forward_slow_upstream_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let client = UpstreamClient::new(Duration::from_millis(200)).unwrap();
        let result = client
            .forward(
                Upstream::TodoService,
                outbound(Method::GET, format!("{}/", server.uri())),
            )
            .await;

        assert!(matches!(result, Err(GatewayError::UpstreamTimeout(_))));
    }
}
