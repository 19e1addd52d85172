use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState, access, auth,
    error::{ApiError, MessageResponse},
    extractors::ValidatedJson,
    models::{AuthResponse, LoginRequest, NewUser, RegisterRequest},
};

/// register
///
/// [Public Route] Creates a "user"-role account and signs the caller in immediately.
/// The password is hashed before it reaches the repository; a taken email is a 409.
#[utoipa::path(
    post,
    path = "/api/v1/users/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = AuthResponse),
        (status = 400, description = "Invalid input", body = MessageResponse),
        (status = 409, description = "Email taken", body = MessageResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let password_hash = auth::hash_password(payload.password).await?;

    let user = state
        .repo
        .create_user(NewUser {
            full_name: payload.full_name,
            email: payload.email,
            password_hash,
            role: access::DEFAULT_ROLE.to_string(),
        })
        .await?;

    let token = auth::issue_token(&state.config, &user)?;
    tracing::info!(user_id = user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully!".to_string(),
            token,
            user: user.into(),
        }),
    ))
}

/// login
///
/// [Public Route] Exchanges email and password for a token. Unknown emails and wrong
/// passwords get the identical 401.
#[utoipa::path(
    post,
    path = "/api/v1/users/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 400, description = "Invalid input", body = MessageResponse),
        (status = 401, description = "Incorrect email or password", body = MessageResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Some(user) = state.repo.find_user_by_email(&payload.email).await? else {
        auth::verify_unknown_account(payload.password).await?;
        tracing::warn!("login failed: unknown email");
        return Err(ApiError::bad_credentials());
    };

    if !auth::verify_password(payload.password, user.password_hash.clone()).await? {
        tracing::warn!(user_id = user.id, "login failed: wrong password");
        return Err(ApiError::bad_credentials());
    }

    let token = auth::issue_token(&state.config, &user)?;
    tracing::info!(user_id = user.id, "user logged in");

    Ok(Json(AuthResponse {
        message: "You are logged in!".to_string(),
        token,
        user: user.into(),
    }))
}
