//! Access-control decisions.
//!
//! Every authorization question the API asks is answered here, from the requester's
//! resolved identity and the target's owner/accessType. Handlers turn a `false` into
//! a 403; the list and search queries use [`Visibility`] so a document is listed
//! exactly when it could be fetched by id.

use crate::{auth::AuthUser, error::ApiError, models::Document};

pub const ADMIN: &str = "admin";
/// Role given to self-registered accounts.
pub const DEFAULT_ROLE: &str = "user";
pub const PUBLIC: &str = "public";
pub const PRIVATE: &str = "private";

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN
    }

    pub fn owns(&self, document: &Document) -> bool {
        self.id == document.user_id
    }
}

/// Admin, owner, or an accessType of "public" or the requester's own role.
pub fn can_view_document(requester: &AuthUser, document: &Document) -> bool {
    Visibility::for_requester(requester).permits(document)
}

/// Only the owner edits a document; admins moderate by deleting.
pub fn can_update_document(requester: &AuthUser, document: &Document) -> bool {
    requester.owns(document)
}

pub fn can_delete_document(requester: &AuthUser, document: &Document) -> bool {
    requester.is_admin() || requester.owns(document)
}

/// Self or admin: viewing, updating, deleting an account or listing its documents.
pub fn can_manage_user(requester: &AuthUser, user_id: i32) -> bool {
    requester.is_admin() || requester.id == user_id
}

/// A role change is an admin action, even on one's own account.
pub fn can_change_role(requester: &AuthUser, current_role: &str, requested_role: &str) -> bool {
    requester.is_admin() || current_role == requested_role
}

/// accessType values a user with `role` may assign: "public", "private", or their role.
pub fn is_assignable_access_type(role: &str, access_type: &str) -> bool {
    access_type == PUBLIC || access_type == PRIVATE || access_type == role
}

/// Converts a decision into the handler's 403.
pub fn ensure(allowed: bool) -> Result<(), ApiError> {
    if allowed {
        Ok(())
    } else {
        Err(ApiError::unauthorized_access())
    }
}

pub fn require_admin(requester: &AuthUser) -> Result<(), ApiError> {
    if !requester.is_admin() {
        tracing::warn!(user_id = requester.id, role = %requester.role, "admin route denied");
    }
    ensure(requester.is_admin())
}

/// Visibility
///
/// The document-visibility rule as a filter. `PostgresRepository` renders it as SQL,
/// `MemoryRepository` evaluates `permits` directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    /// Admin: every document.
    All,
    /// Everyone else: public, their role's, and their own.
    Restricted { user_id: i32, role: String },
}

impl Visibility {
    pub fn for_requester(requester: &AuthUser) -> Self {
        if requester.is_admin() {
            Visibility::All
        } else {
            Visibility::Restricted {
                user_id: requester.id,
                role: requester.role.clone(),
            }
        }
    }

    pub fn permits(&self, document: &Document) -> bool {
        match self {
            Visibility::All => true,
            Visibility::Restricted { user_id, role } => {
                document.user_id == *user_id
                    || document.access_type == PUBLIC
                    || document.access_type == *role
            }
        }
    }
}
