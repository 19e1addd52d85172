use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::{
    access,
    config::{AdminSeed, AppConfig},
    error::ApiError,
    models::{NewUser, User},
    repository::{Repository, RepositoryState},
};

/// Claims
///
/// The payload signed into every token issued at register/login. The role and name
/// are informational; the extractor re-reads both from the database on every request.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// users.id of the bearer.
    pub id: i32,
    pub role: String,
    pub full_name: String,
    /// Issued At.
    pub iat: usize,
    /// Expiration Time. Always validated.
    pub exp: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request: who is asking, and with which role.
/// Handlers take it as an argument; the access module makes every decision from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i32,
    pub role: String,
    // Stamped onto documents as their display owner.
    pub full_name: String,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role.clone(),
            full_name: user.full_name.clone(),
        }
    }
}

// --- Tokens ---

/// issue_token
///
/// Signs an HS256 token for `user`, valid for the configured number of hours.
pub fn issue_token(config: &AppConfig, user: &User) -> Result<String, ApiError> {
    let now = Utc::now();
    let expires = now + Duration::hours(config.token_ttl_hours);
    let claims = Claims {
        id: user.id,
        role: user.role.clone(),
        full_name: user.full_name.clone(),
        iat: now.timestamp() as usize,
        exp: expires.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
}

/// decode_token
///
/// Verifies signature and expiry. Every failure kind collapses to the same 401.
pub fn decode_token(config: &AppConfig, token: &str) -> Result<Claims, ApiError> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => Ok(data.claims),
        Err(e) => {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("expired token presented"),
                other => tracing::debug!("rejected token: {:?}", other),
            }
            Err(invalid_token())
        }
    }
}

fn invalid_token() -> ApiError {
    ApiError::Unauthenticated("Token not valid, please login".to_string())
}

fn missing_token() -> ApiError {
    ApiError::Unauthenticated("Please set a token in the Authorization header".to_string())
}

// --- Passwords ---

/// hash_password
///
/// Argon2id with a fresh random salt, encoded as a PHC string. Runs on the blocking pool.
pub async fn hash_password(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
    })
    .await
    .map_err(|e| ApiError::Internal(format!("hashing task failed: {e}")))?
}

/// verify_password
///
/// `Ok(false)` for a wrong password; `Err` only when the stored hash is unreadable.
pub async fn verify_password(password: String, stored_hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || -> Result<bool, ApiError> {
        let parsed = PasswordHash::new(&stored_hash)
            .map_err(|e| ApiError::Internal(format!("stored hash is malformed: {e}")))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| ApiError::Internal(format!("verification task failed: {e}")))?
}

/// Hash of a throwaway secret, computed once, for sign-ins against unknown emails.
static UNKNOWN_ACCOUNT_HASH: OnceCell<String> = OnceCell::const_new();

/// verify_unknown_account
///
/// Runs the same Argon2 verification a registered account would cost, against a hash
/// no password matches, so a missing email answers no faster than a wrong password.
/// Always `Ok(false)` unless the hashing itself fails.
pub async fn verify_unknown_account(password: String) -> Result<bool, ApiError> {
    let stored_hash = UNKNOWN_ACCOUNT_HASH
        .get_or_try_init(|| hash_password(random_secret()))
        .await?
        .clone();
    verify_password(password, stored_hash).await.map(|_| false)
}

fn random_secret() -> String {
    SaltString::generate(&mut OsRng).as_str().to_string()
}

/// bootstrap_admin
///
/// Creates the configured admin account at startup unless that email is already taken.
pub async fn bootstrap_admin(repo: &dyn Repository, seed: &AdminSeed) -> Result<(), ApiError> {
    if repo.find_user_by_email(&seed.email).await?.is_some() {
        tracing::debug!(email = %seed.email, "admin account already present");
        return Ok(());
    }

    let password_hash = hash_password(seed.password.clone()).await?;
    let admin = repo
        .create_user(NewUser {
            full_name: seed.full_name.clone(),
            email: seed.email.clone(),
            password_hash,
            role: access::ADMIN.to_string(),
        })
        .await?;

    tracing::info!(user_id = admin.id, "bootstrapped admin account");
    Ok(())
}

// --- Extractor ---

/// AuthUser Extractor Implementation
///
/// 1. Reuse an identity already resolved by the auth middleware for this request.
/// 2. Read the `Authorization` header (`Bearer <token>` or the bare token).
/// 3. Verify the JWT.
/// 4. Load the user, so deleted accounts and role changes take effect immediately.
///
/// Rejection: 401 with a `{message}` body.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(resolved) = parts.extensions.get::<AuthUser>() {
            return Ok(resolved.clone());
        }

        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let raw = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(missing_token)?;

        let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
        let claims = decode_token(&config, token)?;

        let user = repo.find_user(claims.id).await?.ok_or_else(|| {
            tracing::warn!(user_id = claims.id, "token for a user that no longer exists");
            invalid_token()
        })?;

        Ok(AuthUser::from(&user))
    }
}
