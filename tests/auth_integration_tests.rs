mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use dman_api::{
    AppConfig, MemoryRepository,
    auth::{self, Claims},
    config::AdminSeed,
    repository::Repository,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

use common::{get, seed_user, send, test_app};

fn now_secs() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

fn sign(claims: &Claims, secret: &str) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

async fn raw_authorization(app: &axum::Router, value: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/documents")
        .header(header::AUTHORIZATION, value)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// --- Token Issue/Decode ---

#[tokio::test]
async fn test_issued_token_round_trips_claims() {
    let (_app, state) = test_app();
    let (user, token) = seed_user(&state, "Ada Lovelace", "ada@example.com", "editor").await;

    let claims = auth::decode_token(&state.config, &token).unwrap();
    assert_eq!(claims.id, user.id);
    assert_eq!(claims.role, "editor");
    assert_eq!(claims.full_name, "Ada Lovelace");
    assert_eq!(claims.exp - claims.iat, 72 * 3600);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let config = AppConfig::default();
    let claims = Claims {
        id: 1,
        role: "admin".into(),
        full_name: "Mallory".into(),
        iat: now_secs(),
        exp: now_secs() + 3600,
    };
    let forged = sign(&claims, "not-the-secret");

    let err = auth::decode_token(&config, &forged).unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(err.to_string(), "Token not valid, please login");
}

// --- Extractor via the router ---

#[tokio::test]
async fn test_missing_header_is_401() {
    let (app, _state) = test_app();
    let (status, body) = send(&app, Method::GET, "/api/v1/documents", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Please set a token in the Authorization header");
}

#[tokio::test]
async fn test_garbage_token_is_401() {
    let (app, _state) = test_app();
    let (status, body) = get(&app, "/api/v1/documents", "definitely.not.a.jwt").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token not valid, please login");
}

#[tokio::test]
async fn test_expired_token_is_401() {
    let (app, state) = test_app();
    let (user, _) = seed_user(&state, "Old Timer", "old@example.com", "user").await;

    let claims = Claims {
        id: user.id,
        role: user.role.clone(),
        full_name: user.full_name.clone(),
        iat: now_secs() - 7200,
        exp: now_secs() - 3600,
    };
    let expired = sign(&claims, &state.config.jwt_secret);

    let (status, _) = get(&app, "/api/v1/documents", &expired).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bearer_and_bare_tokens_are_accepted() {
    let (app, state) = test_app();
    let (_, token) = seed_user(&state, "Bea", "bea@example.com", "user").await;

    let (status, _) = raw_authorization(&app, &format!("Bearer {token}")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = raw_authorization(&app, &token).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_token_of_deleted_user_is_401() {
    let (app, state) = test_app();
    let (user, token) = seed_user(&state, "Gone", "gone@example.com", "user").await;

    assert!(state.repo.delete_user(user.id).await.unwrap());

    let (status, body) = get(&app, "/api/v1/documents", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token not valid, please login");
}

#[tokio::test]
async fn test_role_is_read_from_database_not_token() {
    let (app, state) = test_app();
    let (user, token) = seed_user(&state, "Promoted", "promo@example.com", "user").await;

    let (status, _) = get(&app, "/api/v1/users", &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    state
        .repo
        .update_user(
            user.id,
            dman_api::models::UserChanges {
                role: Some("admin".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // Same token, new role.
    let (status, _) = get(&app, "/api/v1/users", &token).await;
    assert_eq!(status, StatusCode::OK);
}

// --- Passwords ---

#[tokio::test]
async fn test_password_hash_verifies_only_the_original() {
    let hash = auth::hash_password("s3cret-pass".into()).await.unwrap();

    assert!(hash.starts_with("$argon2"));
    assert!(!hash.contains("s3cret-pass"));
    assert!(auth::verify_password("s3cret-pass".into(), hash.clone()).await.unwrap());
    assert!(!auth::verify_password("wrong-pass".into(), hash).await.unwrap());
}

#[tokio::test]
async fn test_unknown_account_verification_never_matches() {
    for password in ["password1", "", "s3cret-pass"] {
        assert!(!auth::verify_unknown_account(password.into()).await.unwrap());
    }
}

#[tokio::test]
async fn test_malformed_stored_hash_is_an_internal_error() {
    let err = auth::verify_password("anything".into(), "plaintext".into())
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// --- Admin bootstrap ---

#[tokio::test]
async fn test_bootstrap_admin_is_idempotent() {
    let repo = MemoryRepository::new();
    let seed = AdminSeed {
        full_name: "Root".into(),
        email: "root@example.com".into(),
        password: "rootpass1".into(),
    };

    auth::bootstrap_admin(&repo, &seed).await.unwrap();
    auth::bootstrap_admin(&repo, &seed).await.unwrap();

    let admin = repo
        .find_user_by_email("root@example.com")
        .await
        .unwrap()
        .expect("admin should exist");
    assert_eq!(admin.role, "admin");
    assert_eq!(repo.list_users(Default::default()).await.unwrap().total, 1);
}
