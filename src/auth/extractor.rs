//! AuthUser extractor for Axum handlers.
//!
//! The extractor form of the auth gate. On routes behind `require_auth` it
//! reads the Claims the middleware injected; on routes gated per-handler it
//! performs the same cookie-extract + verify sequence itself. Either way a
//! handler taking `AuthUser` cannot run without a valid session.

use crate::api::handlers::{AppError, SharedState};
use crate::auth::cookie::extract_session_token;
use crate::auth::jwt::{decode_jwt, Claims};
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use uuid::Uuid;

/// Authenticated subject extracted from the verified session token.
///
/// Use this as a handler parameter to require authentication and access
/// the caller's identity:
///
/// ```rust,ignore
/// async fn my_handler(user: AuthUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.user_id)
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
}

impl AuthUser {
    /// Create from verified claims
    fn from_claims(claims: &Claims) -> Result<Self, AppError> {
        let user_id: Uuid = claims
            .sub
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

        Ok(Self { user_id })
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async {
            // Claims injected by the require_auth middleware, if it ran
            if let Some(claims) = parts.extensions.get::<Claims>() {
                return Self::from_claims(claims);
            }

            // Otherwise run the gate here: cookie → verify → subject
            let token = parts
                .headers
                .get(header::COOKIE)
                .and_then(|v| v.to_str().ok())
                .and_then(extract_session_token)
                .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))?;

            let claims = decode_jwt(&token, &state.auth.jwt_secret)
                .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

            Self::from_claims(&claims)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
