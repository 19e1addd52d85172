use axum::{Json, extract::State};

use crate::{AppState, auth::AuthUser, error::ApiError, models::RoleListResponse};

/// list_roles
///
/// [Authenticated Route] The role names accepted by user creation and role updates.
#[utoipa::path(
    get,
    path = "/api/v1/roles",
    responses((status = 200, description = "Roles", body = RoleListResponse))
)]
pub async fn list_roles(
    _requester: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<RoleListResponse>, ApiError> {
    let roles = state.repo.list_roles().await?;
    Ok(Json(RoleListResponse { roles }))
}
