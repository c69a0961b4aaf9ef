//! Route-based reverse proxy.
//!
//! # Components
//!
//! - `route_table` - Explicit route rules and the longest-prefix matcher
//! - `outbound` - Builds the upstream request from the inbound one
//!   (path rewrite, identity injection, body re-serialization)
//! - `upstream` - Pooled HTTP client that sends the request and relays the
//!   response

pub mod outbound;
pub mod route_table;
pub mod upstream;

pub use outbound::OutboundRequest;
pub use route_table::{contains_dot_segment, PathRewrite, RouteRule, RouteTable, Upstream};
pub use upstream::UpstreamClient;
