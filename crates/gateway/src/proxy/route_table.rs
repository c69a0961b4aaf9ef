//! Proxy route table.
//!
//! Two rules exist in production:
//!
//! | Prefix   | Upstream     | Auth | Rewrite      | `x-user-id` |
//! |----------|--------------|------|--------------|-------------|
//! | `/auth`  | Auth Service | no   | preserve     | no          |
//! | `/todos` | Todo Service | yes  | strip prefix | injected    |
//!
//! Matching is on path-segment boundaries: `/todos` matches `/todos`,
//! `/todos/` and `/todos/42`, but not `/todosx`.
//!
//! Paths with `.` or `..` segments (plain or percent-encoded) are refused
//! before matching. The upstream URL parser would resolve them, so the
//! forwarded path would no longer be the one the client sent.

use crate::config::Config;

/// Upstream service a rule forwards to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    AuthService,
    TodoService,
}

impl Upstream {
    /// Bounded label for logs and metrics.
    pub fn label(self) -> &'static str {
        match self {
            Upstream::AuthService => "auth",
            Upstream::TodoService => "todo",
        }
    }
}

/// How the inbound path maps onto the upstream path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRewrite {
    /// Forward the path unchanged.
    Preserve,
    /// Remove the rule prefix; an empty remainder becomes `/`.
    StripPrefix,
}

#[derive(Debug, Clone)]
pub struct RouteRule {
    pub prefix: String,
    pub upstream: Upstream,
    /// Upstream base URL without a trailing slash.
    pub base_url: String,
    pub requires_auth: bool,
    pub rewrite: PathRewrite,
    /// Overwrite `x-user-id` with the verified identity. Also enables JSON
    /// re-serialization of write bodies.
    pub inject_identity: bool,
}

impl RouteRule {
    /// Whether `path` falls under this rule's prefix on a segment boundary.
    pub fn matches(&self, path: &str) -> bool {
        path.strip_prefix(self.prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    /// Upstream path for an inbound path this rule matched.
    pub fn rewrite_path<'a>(&self, path: &'a str) -> &'a str {
        match self.rewrite {
            PathRewrite::Preserve => path,
            PathRewrite::StripPrefix => match path.strip_prefix(self.prefix.as_str()) {
                Some("") | None => "/",
                Some(rest) => rest,
            },
        }
    }

    /// Full upstream URL, keeping the query string untouched.
    pub fn target_url(&self, path: &str, query: Option<&str>) -> String {
        let rewritten = self.rewrite_path(path);
        match query {
            Some(query) => format!("{}{}?{}", self.base_url, rewritten, query),
            None => format!("{}{}", self.base_url, rewritten),
        }
    }
}

/// Whether any segment of `path` is a dot segment the URL parser resolves.
///
/// Both `/` and `\` count as separators, since `http` URLs treat them alike.
pub fn contains_dot_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| {
        matches!(
            segment.to_ascii_lowercase().as_str(),
            "." | ".." | "%2e" | "%2e%2e" | ".%2e" | "%2e."
        )
    })
}

/// Ordered set of proxy rules, built once at startup.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// The production table: `/auth` and `/todos`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(vec![
            RouteRule {
                prefix: "/auth".to_string(),
                upstream: Upstream::AuthService,
                base_url: config.auth_service_url.clone(),
                requires_auth: false,
                rewrite: PathRewrite::Preserve,
                inject_identity: false,
            },
            RouteRule {
                prefix: "/todos".to_string(),
                upstream: Upstream::TodoService,
                base_url: config.todo_service_url.clone(),
                requires_auth: true,
                rewrite: PathRewrite::StripPrefix,
                inject_identity: true,
            },
        ])
    }

    /// Select the rule with the longest prefix matching `path`.
    pub fn match_path(&self, path: &str) -> Option<&RouteRule> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(path))
            .max_by_key(|rule| rule.prefix.len())
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }
}
