use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::ApiError,
    extractors::Validate,
    pagination::{Page, PageMeta},
};

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A row of the `users` table. Carries the Argon2 password hash, so it is never
/// serialized directly: handlers convert it into a `UserResponse` first.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub full_name: String,
    // Unique across the table (users_email_key).
    pub email: String,
    pub password_hash: String,
    // Loosely references roles.name.
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Document
///
/// A row of the `documents` table. `owner` is the creator's display name at creation
/// time; `user_id` is the authoritative ownership link used for authorization.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Document {
    pub id: i32,
    // Unique across the table (documents_title_key).
    pub title: String,
    pub content: String,
    pub owner: String,
    /// "public", "private", or a role name.
    pub access_type: String,
    pub user_id: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Role
///
/// Lookup row of the `roles` table ("admin", "user", "editor").
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Role {
    pub id: i32,
    pub name: String,
}

// --- Repository Inputs ---

/// Insert payload for a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

/// Partial user update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    pub owner: String,
    pub access_type: String,
    pub user_id: i32,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub access_type: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for the public registration endpoint (POST /users/auth/register).
/// Missing fields deserialize as empty strings so validation can report them by name.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

/// LoginRequest
///
/// Input payload for POST /users/auth/login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// CreateUserRequest
///
/// Admin-only account creation (POST /users/createuser). `role` defaults to "user".
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct CreateUserRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// UpdateUserRequest
///
/// Partial profile update (PUT /users/{id}). Only an admin may set `role`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// CreateDocumentRequest
///
/// Input payload for POST /documents. The owner is always the authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct CreateDocumentRequest {
    pub title: String,
    pub content: String,
    pub access_type: String,
}

/// UpdateDocumentRequest
///
/// Partial update payload for PUT /documents/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateDocumentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_type: Option<String>,
}

// --- Query Parameters ---

/// PageQuery
///
/// `?limit=&offset=` kept as raw strings so non-integers produce a 400 with our own
/// message instead of the framework's rejection.
#[derive(Debug, Clone, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> Result<Page, ApiError> {
        Page::parse(self.limit.as_deref(), self.offset.as_deref())
    }
}

/// SearchQuery
///
/// `?q=&limit=&offset=` for the search endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Free-text keyword; sanitized before use.
    pub q: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl SearchQuery {
    pub fn page(&self) -> Result<Page, ApiError> {
        Page::parse(self.limit.as_deref(), self.offset.as_deref())
    }
}

// --- Response Schemas (Output) ---

/// UserResponse
///
/// The public projection of a `User`. Never carries the password or its hash.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserResponse {
    pub id: i32,
    pub full_name: String,
    pub email: String,
    pub role: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// AuthResponse
///
/// Returned by register (201) and login (200).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserEnvelope {
    pub message: String,
    pub user: UserResponse,
}

/// UserListResponse
///
/// Paginated user listing (GET /users) and search results (GET /search/users).
/// Search responses also carry a summary `message`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserListResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub users: Vec<UserResponse>,
    pub meta_data: PageMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DocumentEnvelope {
    pub message: String,
    pub document: Document,
}

/// DocumentListResponse
///
/// Paginated listing for GET /documents and GET /users/{id}/documents.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DocumentListResponse {
    pub documents: Vec<Document>,
    pub meta_data: PageMeta,
}

/// DocumentSearchResponse
///
/// GET /search/documents. The hits are returned under the singular `document` key.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DocumentSearchResponse {
    pub message: String,
    pub document: Vec<Document>,
    pub meta_data: PageMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RoleListResponse {
    pub roles: Vec<Role>,
}

// --- Validation ---

const PASSWORD_MIN: usize = 7;
const PASSWORD_MAX: usize = 20;

fn require(value: &str, message: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(message.to_string()));
    }
    Ok(())
}

/// is_valid_email
///
/// Structural check only: one `@`, a non-empty local part, and a dotted domain
/// with non-empty labels. No whitespace anywhere.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

fn check_email(email: &str, required: &str) -> Result<(), ApiError> {
    require(email, required)?;
    if !is_valid_email(email) {
        return Err(ApiError::Validation("Invalid email address!".to_string()));
    }
    Ok(())
}

fn check_password(password: &str) -> Result<(), ApiError> {
    require(password, "Please enter a password")?;
    let len = password.chars().count();
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&len) {
        return Err(ApiError::Validation(format!(
            "Password must contain between {PASSWORD_MIN} and {PASSWORD_MAX} characters"
        )));
    }
    Ok(())
}

fn check_access_type(access_type: &str) -> Result<(), ApiError> {
    require(access_type, "Please enter an Access Type")?;
    if !access_type.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ApiError::Validation(
            "Access Type must contain letters only".to_string(),
        ));
    }
    Ok(())
}

fn normalize_email(email: &mut String) {
    *email = email.trim().to_lowercase();
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

impl Validate for RegisterRequest {
    fn normalize(&mut self) {
        trim_in_place(&mut self.full_name);
        normalize_email(&mut self.email);
    }

    fn validate(&self) -> Result<(), ApiError> {
        require(&self.full_name, "Fullname is Required")?;
        check_email(&self.email, "An email is required")?;
        check_password(&self.password)
    }
}

impl Validate for LoginRequest {
    fn normalize(&mut self) {
        normalize_email(&mut self.email);
    }

    fn validate(&self) -> Result<(), ApiError> {
        check_email(&self.email, "An email address is required")?;
        require(&self.password, "Please enter a password")
    }
}

impl Validate for CreateUserRequest {
    fn normalize(&mut self) {
        trim_in_place(&mut self.full_name);
        normalize_email(&mut self.email);
        if let Some(role) = self.role.as_mut() {
            *role = role.trim().to_lowercase();
        }
    }

    fn validate(&self) -> Result<(), ApiError> {
        require(&self.full_name, "Fullname is Required")?;
        check_email(&self.email, "An email is required")?;
        check_password(&self.password)?;
        if let Some(role) = &self.role {
            require(role, "Role cannot be empty")?;
        }
        Ok(())
    }
}

impl Validate for UpdateUserRequest {
    fn normalize(&mut self) {
        if let Some(name) = self.full_name.as_mut() {
            trim_in_place(name);
        }
        if let Some(email) = self.email.as_mut() {
            normalize_email(email);
        }
        if let Some(role) = self.role.as_mut() {
            *role = role.trim().to_lowercase();
        }
    }

    fn validate(&self) -> Result<(), ApiError> {
        if let Some(name) = &self.full_name {
            require(name, "Fullname is Required")?;
        }
        if let Some(email) = &self.email {
            check_email(email, "An email is required")?;
        }
        if let Some(password) = &self.password {
            check_password(password)?;
        }
        if let Some(role) = &self.role {
            require(role, "Role cannot be empty")?;
        }
        Ok(())
    }
}

impl Validate for CreateDocumentRequest {
    fn normalize(&mut self) {
        trim_in_place(&mut self.title);
        trim_in_place(&mut self.access_type);
    }

    fn validate(&self) -> Result<(), ApiError> {
        require(&self.title, "Please enter a title")?;
        require(&self.content, "Empty content. Please enter content here!")?;
        check_access_type(&self.access_type)
    }
}

impl Validate for UpdateDocumentRequest {
    fn normalize(&mut self) {
        if let Some(title) = self.title.as_mut() {
            trim_in_place(title);
        }
        if let Some(access_type) = self.access_type.as_mut() {
            trim_in_place(access_type);
        }
    }

    fn validate(&self) -> Result<(), ApiError> {
        if let Some(title) = &self.title {
            require(title, "Please enter a title")?;
        }
        if let Some(content) = &self.content {
            require(content, "Empty content. Please enter content here!")?;
        }
        if let Some(access_type) = &self.access_type {
            check_access_type(access_type)?;
        }
        Ok(())
    }
}
