use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request, rejection::JsonRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Validate
///
/// Implemented by every request DTO. `normalize` runs first (trimming, lowercasing
/// emails), then `validate` reports the first broken rule as a 400.
pub trait Validate {
    fn normalize(&mut self) {}

    fn validate(&self) -> Result<(), ApiError>;
}

/// ValidatedJson
///
/// A JSON body that has been deserialized, normalized and validated. Malformed JSON
/// and failed rules are both rejected with `ApiError::Validation`.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(mut value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| {
                tracing::debug!("rejected request body: {}", rejection.body_text());
                ApiError::Validation("Sorry, an invalid JSON value found :(".to_string())
            })?;

        value.normalize();
        value.validate()?;
        Ok(Self(value))
    }
}

/// PathId
///
/// The `{id}` path segment as a positive integer. Anything else is a 400 before the
/// handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathId(pub i32);

impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::invalid_id())?;

        parse_id(&raw).map(PathId)
    }
}

pub fn parse_id(raw: &str) -> Result<i32, ApiError> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(ApiError::invalid_id)
}
