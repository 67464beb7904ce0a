//! Shared helpers for integration tests: an in-memory application instance
//! and a small JSON request driver.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use eventflow::auth::session::MemorySessionStore;
use eventflow::config::AuthConfig;
use eventflow::server::{build_router, AppState};
use eventflow::store::memory::MemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Build a router over in-memory stores.
pub fn test_app() -> Router {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(
        store.clone(),
        store.clone(),
        store,
        Arc::new(MemorySessionStore::new()),
        AuthConfig {
            session_ttl: 86_400,
            min_password_len: 8,
        },
    );
    build_router(state)
}

/// Send one request, returning the status and the parsed JSON body
/// (`Value::Null` for empty bodies).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Sign up an account and log in, returning the bearer token.
pub async fn signup_and_login(
    app: &Router,
    name: &str,
    email: &str,
    password: &str,
    role: Option<&str>,
) -> String {
    let mut signup = json!({ "name": name, "email": email, "password": password });
    if let Some(role) = role {
        signup["role"] = json!(role);
    }
    let (status, _) = send(app, "POST", "/auth/signup", None, Some(signup)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

/// Create an event as the given admin, returning its id.
pub async fn create_event(app: &Router, admin_token: &str, name: &str, attendees: i32) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/events",
        Some(admin_token),
        Some(json!({
            "name": name,
            "description": "An event",
            "location": "Main hall",
            "date": "2026-09-01",
            "time": "19:00 - 22:00",
            "price": "$25",
            "attendees": attendees,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create_event failed: {body}");
    body["id"].as_str().unwrap().to_string()
}
