use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Admin Router Module
///
/// Account administration. Authentication comes from the shared layer in
/// `create_router`; each handler then calls `access::require_admin`, so a valid
/// non-admin token gets a 403 rather than a 401.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /users/createuser
        // Creates an account with any existing role.
        .route("/users/createuser", post(handlers::users::create_user))
        // GET /users
        .route("/users", get(handlers::users::list_users))
        // GET /search/users?q=
        // Matches full name or email.
        .route("/search/users", get(handlers::users::search_users))
}
