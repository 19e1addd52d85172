use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};

use crate::{
    AppState, access, auth,
    auth::AuthUser,
    error::{ApiError, MessageResponse},
    extractors::{PathId, ValidatedJson},
    models::{
        CreateUserRequest, DocumentListResponse, NewUser, PageQuery, SearchQuery,
        UpdateUserRequest, User, UserChanges, UserEnvelope, UserListResponse, UserResponse,
    },
    pagination::PageMeta,
    repository::DocumentFilter,
    search,
};

fn user_not_found() -> ApiError {
    ApiError::NotFound("Sorry, the user does not exist!".to_string())
}

async fn load_user(state: &AppState, id: i32) -> Result<User, ApiError> {
    state.repo.find_user(id).await?.ok_or_else(user_not_found)
}

async fn ensure_role_exists(state: &AppState, role: &str) -> Result<(), ApiError> {
    if state.repo.role_exists(role).await? {
        Ok(())
    } else {
        Err(ApiError::Validation("Invalid role".to_string()))
    }
}

/// create_user
///
/// [Admin Route] Creates an account with an explicit role (default "user"). The role
/// must exist in the roles table.
#[utoipa::path(
    post,
    path = "/api/v1/users/createuser",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Created", body = UserEnvelope),
        (status = 400, description = "Invalid input", body = MessageResponse),
        (status = 403, description = "Not an admin", body = MessageResponse),
        (status = 409, description = "Email taken", body = MessageResponse)
    )
)]
pub async fn create_user(
    requester: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserEnvelope>), ApiError> {
    access::require_admin(&requester)?;

    let role = payload
        .role
        .unwrap_or_else(|| access::DEFAULT_ROLE.to_string());
    ensure_role_exists(&state, &role).await?;

    let password_hash = auth::hash_password(payload.password).await?;
    let user = state
        .repo
        .create_user(NewUser {
            full_name: payload.full_name,
            email: payload.email,
            password_hash,
            role,
        })
        .await?;

    tracing::info!(admin_id = requester.id, user_id = user.id, role = %user.role, "admin created user");

    Ok((
        StatusCode::CREATED,
        Json(UserEnvelope {
            message: "User created successfully!".to_string(),
            user: user.into(),
        }),
    ))
}

/// list_users
///
/// [Admin Route] Every account, paginated by `limit`/`offset`.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(PageQuery),
    responses(
        (status = 200, description = "Users", body = UserListResponse),
        (status = 400, description = "Bad pagination", body = MessageResponse),
        (status = 403, description = "Not an admin", body = MessageResponse)
    )
)]
pub async fn list_users(
    requester: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<UserListResponse>, ApiError> {
    access::require_admin(&requester)?;
    let page = query.page()?;

    let paged = state.repo.list_users(page).await?;
    let meta_data = PageMeta::new(page, paged.items.len(), paged.total);

    Ok(Json(UserListResponse {
        message: None,
        users: paged.items.into_iter().map(UserResponse::from).collect(),
        meta_data,
    }))
}

/// get_user
///
/// [Admin Route] A single account by id.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Found", body = UserEnvelope),
        (status = 400, description = "Invalid id", body = MessageResponse),
        (status = 403, description = "Not an admin", body = MessageResponse),
        (status = 404, description = "Not Found", body = MessageResponse)
    )
)]
pub async fn get_user(
    requester: AuthUser,
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<Json<UserEnvelope>, ApiError> {
    access::require_admin(&requester)?;
    let user = load_user(&state, id).await?;

    Ok(Json(UserEnvelope {
        message: "User found!".to_string(),
        user: user.into(),
    }))
}

/// update_user
///
/// [Authenticated Route] Partial profile update by the account owner or an admin.
///
/// *Authorization*: self-or-admin for the account, admin-only for a role change.
/// A new password is re-hashed; an email held by another account is a 409.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = UserEnvelope),
        (status = 400, description = "Invalid input", body = MessageResponse),
        (status = 403, description = "Not self or admin", body = MessageResponse),
        (status = 404, description = "Not Found", body = MessageResponse),
        (status = 409, description = "Email taken", body = MessageResponse)
    )
)]
pub async fn update_user(
    requester: AuthUser,
    State(state): State<AppState>,
    PathId(id): PathId,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let target = load_user(&state, id).await?;
    if !access::can_manage_user(&requester, target.id) {
        tracing::warn!(requester_id = requester.id, target_id = target.id, "user update denied");
        return Err(ApiError::unauthorized_access());
    }

    if let Some(role) = &payload.role {
        access::ensure(access::can_change_role(&requester, &target.role, role))?;
        ensure_role_exists(&state, role).await?;
    }

    let password_hash = match payload.password {
        Some(password) => Some(auth::hash_password(password).await?),
        None => None,
    };

    let changes = UserChanges {
        full_name: payload.full_name,
        email: payload.email,
        password_hash,
        role: payload.role,
    };

    let user = state
        .repo
        .update_user(target.id, changes)
        .await?
        .ok_or_else(user_not_found)?;

    tracing::info!(requester_id = requester.id, user_id = user.id, "user updated");

    Ok(Json(UserEnvelope {
        message: "Profile successfully updated".to_string(),
        user: user.into(),
    }))
}

/// delete_user
///
/// [Authenticated Route] Removes an account (and, by cascade, its documents).
/// Allowed for the account owner or an admin.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Not self or admin", body = MessageResponse),
        (status = 404, description = "Not Found", body = MessageResponse)
    )
)]
pub async fn delete_user(
    requester: AuthUser,
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<Json<MessageResponse>, ApiError> {
    let target = load_user(&state, id).await?;
    if !access::can_manage_user(&requester, target.id) {
        tracing::warn!(requester_id = requester.id, target_id = target.id, "user delete denied");
        return Err(ApiError::unauthorized_access());
    }

    if !state.repo.delete_user(target.id).await? {
        return Err(user_not_found());
    }

    tracing::info!(requester_id = requester.id, user_id = target.id, "user deleted");
    Ok(Json(MessageResponse::new("User deleted successfully!")))
}

/// get_user_documents
///
/// [Authenticated Route] Every document owned by the account, newest first.
/// Self or admin only, so no visibility narrowing applies beyond ownership.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/documents",
    params(("id" = i32, Path, description = "User ID"), PageQuery),
    responses(
        (status = 200, description = "Documents", body = DocumentListResponse),
        (status = 403, description = "Not self or admin", body = MessageResponse),
        (status = 404, description = "Not Found", body = MessageResponse)
    )
)]
pub async fn get_user_documents(
    requester: AuthUser,
    State(state): State<AppState>,
    PathId(id): PathId,
    Query(query): Query<PageQuery>,
) -> Result<Json<DocumentListResponse>, ApiError> {
    let page = query.page()?;
    let owner = load_user(&state, id).await?;
    access::ensure(access::can_manage_user(&requester, owner.id))?;

    let filter = DocumentFilter::visible(access::Visibility::All).owned_by(owner.id);
    let paged = state.repo.list_documents(&filter, page).await?;
    let meta_data = PageMeta::new(page, paged.items.len(), paged.total);

    Ok(Json(DocumentListResponse {
        documents: paged.items,
        meta_data,
    }))
}

/// search_users
///
/// [Admin Route] Case-insensitive substring search over full name and email.
/// A blank keyword is a 400; no hits is a 404.
///
/// The keyword goes through `search::sanitize`, which drops `@` and `.`, so only
/// fragments of an address match: `q=nasa` finds `mh@nasa.gov`, `q=mh@nasa.gov`
/// becomes `mhnasagov` and finds nothing.
#[utoipa::path(
    get,
    path = "/api/v1/search/users",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matches", body = UserListResponse),
        (status = 400, description = "Missing keyword", body = MessageResponse),
        (status = 403, description = "Not an admin", body = MessageResponse),
        (status = 404, description = "No match", body = MessageResponse)
    )
)]
pub async fn search_users(
    requester: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<UserListResponse>, ApiError> {
    access::require_admin(&requester)?;
    let term = search::search_term(query.q.as_deref())?;
    let page = query.page()?;

    let paged = state.repo.search_users(&term, page).await?;
    if paged.total == 0 {
        return Err(ApiError::NotFound("No user found!".to_string()));
    }
    let meta_data = PageMeta::new(page, paged.items.len(), paged.total);

    Ok(Json(UserListResponse {
        message: Some(format!("Number of users found: {}", paged.total)),
        users: paged.items.into_iter().map(UserResponse::from).collect(),
        meta_data,
    }))
}
