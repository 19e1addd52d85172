/// Router Module Index
///
/// Routes are split by who may reach them. `create_router` mounts all three under
/// `/api/v1`; the authenticated and admin routers share one authentication layer.

/// Registration and login. No token required.
pub mod public;

/// Any valid token. Per-resource ownership and visibility checks run in the handlers.
pub mod authenticated;

/// Account administration. Handlers reject non-admin tokens with a 403.
pub mod admin;
