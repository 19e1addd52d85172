#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use dman_api::{
    AppConfig, AppState, MemoryRepository, create_router,
    auth,
    models::{NewUser, User},
    repository::RepositoryState,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const PASSWORD: &str = "password1";

/// A router over a fresh in-memory repository, plus the state behind it.
pub fn test_app() -> (Router, AppState) {
    let state = AppState {
        repo: Arc::new(MemoryRepository::new()) as RepositoryState,
        config: AppConfig::default(),
    };
    (create_router(state.clone()), state)
}

/// Inserts a user with `PASSWORD` and returns it with a freshly issued token.
pub async fn seed_user(state: &AppState, full_name: &str, email: &str, role: &str) -> (User, String) {
    let password_hash = auth::hash_password(PASSWORD.to_string()).await.unwrap();
    let user = state
        .repo
        .create_user(NewUser {
            full_name: full_name.to_string(),
            email: email.to_string(),
            password_hash,
            role: role.to_string(),
        })
        .await
        .unwrap();
    let token = auth::issue_token(&state.config, &user).unwrap();
    (user, token)
}

/// Sends one request through the router and decodes the JSON body (`Null` if empty).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

pub async fn get(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post(app: &Router, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put(app: &Router, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Creates a document through the API and returns its id.
pub async fn create_document(app: &Router, token: &str, title: &str, access_type: &str) -> i64 {
    let (status, body) = post(
        app,
        "/api/v1/documents",
        token,
        serde_json::json!({ "title": title, "content": "Some content", "accessType": access_type }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "document creation failed: {body}");
    body["document"]["id"].as_i64().unwrap()
}
