use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Public Router Module
///
/// The identity gateway. Both endpoints return a signed token on success.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // POST /users/auth/register
        // Self-service signup; new accounts always get the "user" role.
        .route("/users/auth/register", post(handlers::auth::register))
        // POST /users/auth/login
        .route("/users/auth/login", post(handlers::auth::login))
}
