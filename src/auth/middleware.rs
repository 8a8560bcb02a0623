//! Auth gate middleware for Axum routes.
//!
//! Reads the session cookie, verifies the token and injects Claims into
//! request extensions. No shared mutable state — every invocation is
//! independent, so concurrent requests never interfere.

use crate::api::handlers::{AppError, SharedState};
use crate::auth::cookie::extract_session_token;
use crate::auth::jwt::decode_jwt;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

/// Middleware that requires a valid session cookie.
///
/// # Behavior
/// 1. Extract the `auth_token` cookie → 401 "Unauthorized" if absent
/// 2. Verify the token (signature + expiry) → 401 "Invalid token" on any
///    failure, without revealing which check rejected it
/// 3. Inject `Claims` into request extensions for downstream handlers
pub async fn require_auth(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_session_token)
        .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))?;

    let claims = decode_jwt(&token, &state.auth.jwt_secret)
        .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

// ============================================================================
// Tests
// ============================================================================
