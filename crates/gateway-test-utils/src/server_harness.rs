//! Test server harness for E2E testing
//!
//! Provides `TestGatewayServer`, which runs a real gateway on a random port
//! in front of two wiremock servers standing in for the Auth Service and the
//! Todo Service.

use crate::{TestTokenBuilder, TEST_JWT_SECRET};
use gateway_service::config::Config;
use gateway_service::routes::{self, AppState};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use wiremock::MockServer;

/// Test harness for spawning the gateway in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_login_is_proxied() -> Result<()> {
///     let server = TestGatewayServer::spawn().await?;
///     Mock::given(method("POST"))
///         .and(path("/auth/login"))
///         .respond_with(ResponseTemplate::new(200))
///         .mount(server.auth_service())
///         .await;
///
///     let response = reqwest::Client::new()
///         .post(format!("{}/auth/login", server.url()))
///         .send()
///         .await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestGatewayServer {
    addr: SocketAddr,
    config: Config,
    auth_service: MockServer,
    todo_service: MockServer,
    _handle: JoinHandle<()>,
}

impl TestGatewayServer {
    /// Spawn a gateway with default test configuration.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(&[]).await
    }

    /// Spawn a gateway with extra environment-style overrides.
    ///
    /// The server will:
    /// - Start mock Auth and Todo services
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Start the HTTP server in the background
    ///
    /// Overrides for `AUTH_SERVICE_URL` / `TODO_SERVICE_URL` replace the mock
    /// URLs (e.g. to point at an unreachable address).
    pub async fn spawn_with_vars(overrides: &[(&str, &str)]) -> Result<Self, anyhow::Error> {
        let auth_service = MockServer::start().await;
        let todo_service = MockServer::start().await;

        let mut vars = HashMap::from([
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("AUTH_SERVICE_URL".to_string(), auth_service.uri()),
            ("TODO_SERVICE_URL".to_string(), todo_service.uri()),
            ("JWT_SECRET".to_string(), TEST_JWT_SECRET.to_string()),
            ("UPSTREAM_TIMEOUT_SECONDS".to_string(), "5".to_string()),
            ("GATEWAY_DRAIN_SECONDS".to_string(), "0".to_string()),
        ]);
        for (key, value) in overrides {
            vars.insert((*key).to_string(), (*value).to_string());
        }

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let state = Arc::new(
            AppState::new(config.clone())
                .map_err(|e| anyhow::anyhow!("Failed to create app state: {}", e))?,
        );

        // The global recorder can only be installed once per process
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();

        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            auth_service,
            todo_service,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mock Auth Service.
    pub fn auth_service(&self) -> &MockServer {
        &self.auth_service
    }

    /// Mock Todo Service.
    pub fn todo_service(&self) -> &MockServer {
        &self.todo_service
    }

    /// A valid token for `user_id`, signed with the harness secret.
    pub fn token_for(&self, user_id: &str) -> String {
        TestTokenBuilder::new().for_user(user_id).sign(TEST_JWT_SECRET)
    }
}

impl Drop for TestGatewayServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_spawns_successfully() -> Result<(), anyhow::Error> {
        let server = TestGatewayServer::spawn().await?;

        assert!(server.url().starts_with("http://127.0.0.1:"));

        let response = reqwest::get(format!("{}/health", server.url())).await?;
        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await?, "OK");

        Ok(())
    }

    #[tokio::test]
    async fn test_server_points_at_mock_upstreams() -> Result<(), anyhow::Error> {
        let server = TestGatewayServer::spawn().await?;

        assert_eq!(server.config().auth_service_url, server.auth_service().uri());
        assert_eq!(server.config().todo_service_url, server.todo_service().uri());
        assert_ne!(server.auth_service().uri(), server.todo_service().uri());

        Ok(())
    }

    #[tokio::test]
    async fn test_server_provides_addr() -> Result<(), anyhow::Error> {
        let server = TestGatewayServer::spawn().await?;

        let addr = server.addr();
        assert!(addr.ip().is_loopback());
        assert!(addr.port() > 0);
        assert_eq!(server.url(), format!("http://{}", addr));

        Ok(())
    }
}
