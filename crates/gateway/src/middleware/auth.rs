//! Authentication middleware.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{UserRole, BEARER_TOKEN_PREFIX, LEGACY_TOKEN_HEADER};
use workshop_service_lib::service::Requester;

use crate::state::AppState;

/// Current authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

impl CurrentUser {
    /// Admins act as shop operators.
    pub fn is_operator(&self) -> bool {
        self.role.is_admin()
    }

    pub fn requester(&self) -> Requester {
        Requester {
            id: self.id,
            is_operator: self.is_operator(),
        }
    }
}

/// Check if user may act as an operator.
pub fn require_operator(user: &CurrentUser) -> AppResult<()> {
    if user.is_operator() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Authentication middleware that validates JWT tokens from the
/// `Authorization` or `x-auth-token` header.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = header_token(&request).ok_or(AppError::Unauthorized)?;
    authenticate(&state, &token, request, next).await
}

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Like [`auth_middleware`], but also accepts `?token=` since browsers
/// cannot set headers on WebSocket upgrades.
pub async fn ws_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = header_token(&request)
        .or_else(|| {
            Query::<TokenQuery>::try_from_uri(request.uri())
                .ok()
                .and_then(|Query(q)| q.token)
        })
        .ok_or(AppError::Unauthorized)?;
    authenticate(&state, &token, request, next).await
}

async fn authenticate(
    state: &AppState,
    token: &str,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let claims = state
        .auth()
        .verify_token(token)
        .map_err(|_| AppError::Unauthorized)?;

    let current_user = CurrentUser {
        id: claims.sub,
        role: claims.role(),
        email: claims.email,
        name: claims.name,
    };

    // Insert current user into request extensions
    request.extensions_mut().insert(current_user);

    Ok(next.run(request).await)
}

/// Bearer token from `Authorization`, falling back to `x-auth-token`.
fn header_token(request: &Request<Body>) -> Option<String> {
    let headers = request.headers();

    if let Some(value) = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok()) {
        return value
            .strip_prefix(BEARER_TOKEN_PREFIX)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
    }

    headers
        .get(LEGACY_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
