//! HTTP tests for the `/api/v1/user` routes
//!
//! Each test drives the router directly with `oneshot` against an in-memory
//! store.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use purse_core::config::Config;
use purse_core::ports::Repository;
use purse_core::{Argon2Params, PurseContext};
use purse_server::{router, AppState};

// ============================================================================
// Test Helpers
// ============================================================================

fn app() -> (Router, Arc<PurseContext>) {
    let mut config = Config::default();
    config.jwt_secret = Some("api-test-secret".to_string());
    config.password_params = Argon2Params::minimal();

    let ctx = Arc::new(PurseContext::in_memory(config).expect("Failed to create context"));
    (router(AppState::new(Arc::clone(&ctx))), ctx)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn signup_body(username: &str) -> Value {
    json!({
        "username": username,
        "password": "secret123",
        "firstName": "Test",
        "lastName": "User"
    })
}

async fn signup(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/user/signup",
        Some(signup_body(username)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

// ============================================================================
// POST /signup
// ============================================================================

#[tokio::test]
async fn test_signup_returns_token_for_new_user() {
    let (app, ctx) = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/user/signup",
        Some(signup_body("Alice")),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["msg"], "User created");

    let claims = ctx.token_service.verify(body["token"].as_str().unwrap()).unwrap();
    let user = ctx.repository.get_user_by_username("alice").await.unwrap().unwrap();
    assert_eq!(claims.user_id, user.id);
    assert_eq!(user.first_name, "Test");
}

#[tokio::test]
async fn test_signup_validation_failures_return_411() {
    let (app, ctx) = app();

    let bodies = vec![
        json!({"username": "ab", "password": "secret123", "firstName": "A", "lastName": "B"}),
        json!({"username": "alice", "password": "12345", "firstName": "A", "lastName": "B"}),
        json!({"username": "alice", "password": "secret123", "firstName": "x".repeat(51), "lastName": "B"}),
        json!({"username": "alice", "password": "secret123", "firstName": "A"}),
        json!({"username": 42, "password": "secret123", "firstName": "A", "lastName": "B"}),
    ];

    for body in bodies {
        let (status, response) =
            send(&app, Method::POST, "/api/v1/user/signup", Some(body.clone()), None).await;
        assert_eq!(status, StatusCode::LENGTH_REQUIRED, "body: {}", body);
        assert!(response["message"].is_string());
    }

    assert_eq!(ctx.repository.count_users().await.unwrap(), 0);
}

#[tokio::test]
async fn test_signup_non_json_body_returns_411() {
    let (app, _ctx) = app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/user/signup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::LENGTH_REQUIRED);
}

#[tokio::test]
async fn test_duplicate_signup_returns_409() {
    let (app, ctx) = app();
    signup(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/user/signup",
        Some(signup_body("ALICE")),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].is_string());
    assert_eq!(ctx.repository.count_users().await.unwrap(), 1);
}

// ============================================================================
// POST /signin
// ============================================================================

#[tokio::test]
async fn test_signin_with_correct_and_wrong_credentials() {
    let (app, ctx) = app();
    signup(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/user/signin",
        Some(json!({"username": "alice", "password": "secret123"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "User found");
    assert!(ctx.token_service.verify(body["token"].as_str().unwrap()).is_ok());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/user/signin",
        Some(json!({"username": "alice", "password": "wrong-pass"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn test_signin_validation_failure_returns_411() {
    let (app, _ctx) = app();

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/user/signin",
        Some(json!({"username": "alice"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::LENGTH_REQUIRED);
}

// ============================================================================
// PUT /
// ============================================================================

#[tokio::test]
async fn test_update_requires_valid_token() {
    let (app, _ctx) = app();
    let body = json!({"password": "newsecret"});

    let (status, _) = send(&app, Method::PUT, "/api/v1/user", Some(body.clone()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, response) = send(
        &app,
        Method::PUT,
        "/api/v1/user",
        Some(body),
        Some("not.a.token"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(response["message"].is_string());
}

#[tokio::test]
async fn test_update_password_only_keeps_names() {
    let (app, ctx) = app();
    let token = signup(&app, "alice").await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/v1/user",
        Some(json!({"password": "12345"})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::LENGTH_REQUIRED);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/user",
        Some(json!({"password": "newsecret"})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "User updated");

    let user = ctx.repository.get_user_by_username("alice").await.unwrap().unwrap();
    assert_eq!(user.first_name, "Test");
    assert_eq!(user.last_name, "User");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/user/signin",
        Some(json!({"username": "alice", "password": "newsecret"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_names() {
    let (app, ctx) = app();
    let token = signup(&app, "alice").await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/v1/user",
        Some(json!({"firstName": " Alicia ", "password": "secret123"})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let user = ctx.repository.get_user_by_username("alice").await.unwrap().unwrap();
    assert_eq!(user.first_name, "Alicia");
    assert_eq!(user.last_name, "User");
}

#[tokio::test]
async fn test_update_for_unknown_user_returns_404() {
    let (app, ctx) = app();
    let token = ctx.token_service.issue(Uuid::new_v4()).unwrap();

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/v1/user",
        Some(json!({"password": "secret123"})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_with_trailing_slash() {
    let (app, _ctx) = app();
    let token = signup(&app, "alice").await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/v1/user/",
        Some(json!({"password": "newsecret"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/user/",
        Some(json!({"password": "newsecret"})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "User updated");
}

// ============================================================================
// GET /?filter=
// ============================================================================

#[tokio::test]
async fn test_search_projects_matching_users() {
    let (app, _ctx) = app();
    for name in ["alice", "Malcolm", "bob"] {
        signup(&app, name).await;
    }

    let (status, body) = send(&app, Method::GET, "/api/v1/user?filter=AL", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "User found");

    let users = body["user"].as_array().unwrap();
    let names: Vec<&str> = users.iter().map(|u| u["username"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["alice", "malcolm"]);

    let mut keys: Vec<&str> = users[0].as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort();
    assert_eq!(keys, vec!["firstName", "id", "lastName", "username"]);
}

#[tokio::test]
async fn test_search_without_filter_returns_everyone() {
    let (app, _ctx) = app();
    signup(&app, "alice").await;
    signup(&app, "bob").await;

    let (status, body) = send(&app, Method::GET, "/api/v1/user", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_search_with_trailing_slash() {
    let (app, _ctx) = app();
    signup(&app, "alice").await;
    signup(&app, "bob").await;

    let (status, body) = send(&app, Method::GET, "/api/v1/user/?filter=al", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"].as_array().unwrap().len(), 1);
    assert_eq!(body["user"][0]["username"], "alice");
}

#[tokio::test]
async fn test_search_malformed_query_returns_411() {
    let (app, _ctx) = app();

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/user?filter=a&filter=b",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::LENGTH_REQUIRED);
    assert!(body["message"].as_str().unwrap().starts_with("Incorrect inputs"));
}

#[tokio::test]
async fn test_cors_headers_present() {
    let (app, _ctx) = app();

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/user")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
