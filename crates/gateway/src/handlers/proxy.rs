//! Proxy dispatch handler.
//!
//! Installed as the router fallback, so it sees every request that is not an
//! operational endpoint. Per request:
//!
//! ```text
//! match rule -> reject dot segments -> [authorize] -> buffer body -> prepare outbound -> forward
//! ```
//!
//! Unmatched paths get the welcome response. Authorization and body errors
//! end the request before any upstream call.

use crate::errors::GatewayError;
use crate::handlers::welcome::WELCOME_MESSAGE;
use crate::middleware::authorize;
use crate::proxy::{contains_dot_segment, OutboundRequest};
use crate::routes::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use std::sync::Arc;
use tracing::instrument;

#[instrument(
    skip_all,
    name = "gateway.proxy.dispatch",
    fields(method = %request.method(), route = tracing::field::Empty)
)]
pub async fn dispatch(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, GatewayError> {
    let Some(rule) = state.route_table.match_path(request.uri().path()) else {
        return Ok(WELCOME_MESSAGE.into_response());
    };
    tracing::Span::current().record("route", rule.prefix.as_str());

    if contains_dot_segment(request.uri().path()) {
        return Err(GatewayError::MalformedPath(request.uri().path().to_string()));
    }

    let (parts, body) = request.into_parts();

    let identity = if rule.requires_auth {
        Some(authorize(&state.jwt_validator, &parts.headers)?)
    } else {
        None
    };

    let body = read_body(body, state.config.max_body_bytes).await?;
    let outbound = OutboundRequest::prepare(rule, identity.as_ref(), &parts, body)?;

    state.upstream_client.forward(rule.upstream, outbound).await
}

/// Buffer the request body up to `limit` bytes.
async fn read_body(body: Body, limit: usize) -> Result<Bytes, GatewayError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            tracing::debug!(target: "gateway.proxy", limit = limit, "Request body over limit");
            Err(GatewayError::PayloadTooLarge)
        }
        Err(e) => Err(GatewayError::MalformedRequest(format!(
            "failed to read request body: {e}"
        ))),
    }
}
