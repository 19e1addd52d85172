use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core services: identity, authorization, persistence.
pub mod access;
pub mod auth;
pub mod config;
pub mod repository;

// Request/response plumbing.
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod pagination;
pub mod search;

// Routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::ApiError;
pub use repository::{MemoryRepository, PostgresRepository, Repository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document for every `#[utoipa::path]` handler, served at
/// `/api-docs/openapi.json` and rendered by the Swagger UI.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register, handlers::auth::login,
        handlers::users::create_user, handlers::users::list_users, handlers::users::get_user,
        handlers::users::update_user, handlers::users::delete_user,
        handlers::users::get_user_documents, handlers::users::search_users,
        handlers::documents::create_document, handlers::documents::list_documents,
        handlers::documents::get_document, handlers::documents::update_document,
        handlers::documents::delete_document, handlers::documents::search_documents,
        handlers::roles::list_roles
    ),
    components(
        schemas(
            models::Document, models::Role, models::UserResponse,
            models::RegisterRequest, models::LoginRequest, models::CreateUserRequest,
            models::UpdateUserRequest, models::CreateDocumentRequest, models::UpdateDocumentRequest,
            models::AuthResponse, models::UserEnvelope, models::UserListResponse,
            models::DocumentEnvelope, models::DocumentListResponse, models::DocumentSearchResponse,
            models::RoleListResponse, pagination::PageMeta, error::MessageResponse,
        )
    ),
    tags(
        (name = "dman", description = "Document Management API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container for the services every request needs. Cloned per
/// request.
#[derive(Clone)]
pub struct AppState {
    /// Persistence: Postgres in deployment, in-memory locally and in tests.
    pub repo: RepositoryState,
    /// The loaded, immutable environment configuration (JWT secret, token TTL).
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards the authenticated and admin routers. A failed `AuthUser` extraction
/// short-circuits with a 401; on success the identity is stored in the request
/// extensions so the handler's own `AuthUser` argument does not hit the database again.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// create_router
///
/// Assembles the routing tree under `/api/v1`, applies the authentication layer to the
/// protected routers, and wraps everything in the observability stack.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. API Router Assembly
    let protected = authenticated::authenticated_routes()
        .merge(admin::admin_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api = Router::new()
        .merge(public::public_routes())
        .merge(protected);

    let base_router = Router::new()
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api/v1", api)
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: method, URI and the request id, so every log line
/// emitted while serving a request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
