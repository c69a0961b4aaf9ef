//! Authentication integration tests.
//!
//! Every rejected request must stop at the gateway: the mock Todo Service is
//! checked for zero received calls.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use gateway_test_utils::{TestGatewayServer, TestTokenBuilder, TEST_JWT_SECRET};
use jsonwebtoken::Algorithm;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn todo_calls(server: &TestGatewayServer) -> usize {
    server
        .todo_service()
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}

/// GET /todos with the given Authorization header, expecting a 401.
async fn assert_rejected(
    server: &TestGatewayServer,
    authorization: Option<String>,
    expected_error: &str,
) -> Result<()> {
    let client = reqwest::Client::new();
    let mut request = client.get(format!("{}/todos", server.url()));
    if let Some(value) = authorization {
        request = request.header("authorization", value);
    }

    let response = request.send().await?;

    assert_eq!(response.status(), 401);
    assert_eq!(
        response.headers()["www-authenticate"],
        "Bearer realm=\"todo-gateway\""
    );
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body, json!({ "error": expected_error }));
    assert_eq!(todo_calls(server).await, 0, "todo service must not be called");
    Ok(())
}

#[tokio::test]
async fn test_missing_token_returns_401() -> Result<()> {
    let server = TestGatewayServer::spawn().await?;
    assert_rejected(&server, None, "Unauthorized").await
}

#[tokio::test]
async fn test_non_bearer_scheme_returns_401() -> Result<()> {
    let server = TestGatewayServer::spawn().await?;
    assert_rejected(
        &server,
        Some("Basic dXNlcjpwYXNzd29yZA==".to_string()),
        "Unauthorized",
    )
    .await
}

#[tokio::test]
async fn test_empty_bearer_token_returns_401() -> Result<()> {
    let server = TestGatewayServer::spawn().await?;
    assert_rejected(&server, Some("Bearer ".to_string()), "Unauthorized").await
}

#[tokio::test]
async fn test_expired_token_returns_401() -> Result<()> {
    let server = TestGatewayServer::spawn().await?;
    let token = TestTokenBuilder::new()
        .for_user("u1")
        .expired()
        .sign(TEST_JWT_SECRET);

    assert_rejected(&server, Some(format!("Bearer {token}")), "Invalid token").await
}

#[tokio::test]
async fn test_token_signed_with_other_secret_returns_401() -> Result<()> {
    let server = TestGatewayServer::spawn().await?;
    let token = TestTokenBuilder::new()
        .for_user("u1")
        .sign("not-the-gateway-secret");

    assert_rejected(&server, Some(format!("Bearer {token}")), "Invalid token").await
}

#[tokio::test]
async fn test_token_with_other_algorithm_returns_401() -> Result<()> {
    let server = TestGatewayServer::spawn().await?;
    let token = TestTokenBuilder::new()
        .for_user("u1")
        .with_algorithm(Algorithm::HS384)
        .sign(TEST_JWT_SECRET);

    assert_rejected(&server, Some(format!("Bearer {token}")), "Invalid token").await
}

#[tokio::test]
async fn test_unsigned_token_returns_401() -> Result<()> {
    let server = TestGatewayServer::spawn().await?;
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(
        r#"{{"userId":"u1","exp":{}}}"#,
        Utc::now().timestamp() + 3600
    ));

    assert_rejected(
        &server,
        Some(format!("Bearer {header}.{payload}.")),
        "Invalid token",
    )
    .await
}

#[tokio::test]
async fn test_token_without_user_id_returns_401() -> Result<()> {
    let server = TestGatewayServer::spawn().await?;
    let token = TestTokenBuilder::new().without_user().sign(TEST_JWT_SECRET);

    assert_rejected(&server, Some(format!("Bearer {token}")), "Invalid token").await
}

#[tokio::test]
async fn test_token_without_exp_returns_401() -> Result<()> {
    let server = TestGatewayServer::spawn().await?;
    let token = TestTokenBuilder::new()
        .for_user("u1")
        .without_exp()
        .sign(TEST_JWT_SECRET);

    assert_rejected(&server, Some(format!("Bearer {token}")), "Invalid token").await
}

#[tokio::test]
async fn test_token_issued_in_future_returns_401() -> Result<()> {
    let server = TestGatewayServer::spawn().await?;
    let token = TestTokenBuilder::new()
        .for_user("u1")
        .issued_at(Utc::now().timestamp() + 3600)
        .expires_in(7200)
        .sign(TEST_JWT_SECRET);

    assert_rejected(&server, Some(format!("Bearer {token}")), "Invalid token").await
}

#[tokio::test]
async fn test_garbage_token_returns_401() -> Result<()> {
    let server = TestGatewayServer::spawn().await?;
    assert_rejected(
        &server,
        Some("Bearer definitely-not-a-jwt".to_string()),
        "Invalid token",
    )
    .await
}

#[tokio::test]
async fn test_oversized_token_returns_401() -> Result<()> {
    let server = TestGatewayServer::spawn().await?;
    let token = "a".repeat(9000);

    assert_rejected(&server, Some(format!("Bearer {token}")), "Invalid token").await
}

#[tokio::test]
async fn test_valid_token_reaches_todo_service() -> Result<()> {
    let server = TestGatewayServer::spawn().await?;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("x-user-id", "u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(server.todo_service())
        .await;

    let response = reqwest::Client::new()
        .get(format!("{}/todos", server.url()))
        .bearer_auth(server.token_for("u1"))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    assert_eq!(response.json::<serde_json::Value>().await?, json!([]));
    Ok(())
}

#[tokio::test]
async fn test_token_without_iat_is_accepted() -> Result<()> {
    let server = TestGatewayServer::spawn().await?;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server.todo_service())
        .await;

    let token = TestTokenBuilder::new()
        .for_user("u1")
        .without_iat()
        .sign(TEST_JWT_SECRET);

    let response = reqwest::Client::new()
        .get(format!("{}/todos", server.url()))
        .bearer_auth(token)
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    Ok(())
}

#[tokio::test]
async fn test_auth_routes_do_not_require_token() -> Result<()> {
    let server = TestGatewayServer::spawn().await?;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "t" })))
        .expect(1)
        .mount(server.auth_service())
        .await;

    let response = reqwest::Client::new()
        .post(format!("{}/auth/login", server.url()))
        .json(&json!({ "email": "a@example.com", "password": "pw" }))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.json::<serde_json::Value>().await?,
        json!({ "token": "t" })
    );
    Ok(())
}

#[tokio::test]
async fn test_auth_routes_ignore_invalid_token() -> Result<()> {
    let server = TestGatewayServer::spawn().await?;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(server.auth_service())
        .await;

    let response = reqwest::Client::new()
        .post(format!("{}/auth/register", server.url()))
        .header("authorization", "Bearer garbage")
        .json(&json!({ "email": "a@example.com", "password": "pw" }))
        .send()
        .await?;

    assert_eq!(response.status(), 201);
    Ok(())
}

#[tokio::test]
async fn test_lowercase_bearer_scheme_is_accepted() -> Result<()> {
    let server = TestGatewayServer::spawn().await?;
    Mock::given(method("GET"))
        .and(header("x-user-id", "u1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server.todo_service())
        .await;

    let response = reqwest::Client::new()
        .get(format!("{}/todos", server.url()))
        .header("authorization", format!("bearer {}", server.token_for("u1")))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    Ok(())
}
