//! Middleware for authentication.

mod auth;

pub use auth::{auth_middleware, require_operator, ws_auth_middleware, CurrentUser};
