//! Request handlers, one module per resource.
//!
//! Every handler follows the same shape: extract (identity, path id, validated body),
//! ask the access module, call the repository, wrap the result in a response DTO.

pub mod auth;
pub mod documents;
pub mod roles;
pub mod users;
