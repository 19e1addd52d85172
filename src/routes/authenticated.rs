use crate::{AppState, handlers};
use axum::{
    Router,
    routing::get,
};

/// Authenticated Router Module
///
/// Routes available to any holder of a valid token. The router is wrapped in the
/// authentication layer by `create_router`, so every handler receives a resolved
/// `AuthUser` and only has to answer the authorization question for its resource.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Documents ---
        // GET/POST /documents
        // Listing is narrowed to what the requester may read.
        .route(
            "/documents",
            get(handlers::documents::list_documents).post(handlers::documents::create_document),
        )
        // GET/PUT/DELETE /documents/{id}
        // Read follows the visibility rule, update is owner-only, delete is owner or admin.
        .route(
            "/documents/{id}",
            get(handlers::documents::get_document)
                .put(handlers::documents::update_document)
                .delete(handlers::documents::delete_document),
        )
        // GET /search/documents?q=
        .route("/search/documents", get(handlers::documents::search_documents))
        // --- Accounts ---
        // GET/PUT/DELETE /users/{id}
        // GET is admin-only (checked in the handler); PUT and DELETE are self-or-admin.
        .route(
            "/users/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        // GET /users/{id}/documents
        .route(
            "/users/{id}/documents",
            get(handlers::users::get_user_documents),
        )
        // GET /roles
        .route("/roles", get(handlers::roles::list_roles))
}
