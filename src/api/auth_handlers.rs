//! Authentication route handlers — signup, login, logout, session
//! introspection and Google federation.
//!
//! Endpoints:
//! - `POST /auth/signup`          — Create a password identity (no session)
//! - `POST /auth/login`           — Verify credentials, set the session cookie
//! - `POST /auth/logout`          — Clear the session cookie (idempotent)
//! - `GET  /auth/me`              — Session introspection
//! - `GET  /auth/google`          — Redirect to Google's consent screen
//! - `GET  /auth/google/callback` — Resolve identity, set cookie, redirect

use crate::api::handlers::{AppError, SharedState};
use crate::auth::cookie::{
    build_clear_cookie, build_session_cookie, extract_session_token,
};
use crate::auth::google::GoogleOAuthClient;
use crate::auth::jwt::{decode_jwt, encode_jwt};
use crate::store::{AuthProvider, NewUser, PoiStore, StoreError, User};
use anyhow::anyhow;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Redirect;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request / Response types
// ============================================================================

/// Request body for POST /auth/signup
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub login: String,
    pub password: String,
}

/// Request body for POST /auth/login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// Query parameters Google sends to the callback
#[derive(Debug, Deserialize)]
pub struct GoogleCallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// Acknowledgment with a created-identity summary (never the hash)
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub user: IdentitySummary,
}

#[derive(Debug, Serialize)]
pub struct IdentitySummary {
    pub id: Uuid,
    pub login: String,
}

/// Generic acknowledgment body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Public user info (safe to send to a client)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub login: String,
    pub name: Option<String>,
    pub second_name: Option<String>,
    pub provider: AuthProvider,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            login: u.login,
            name: u.name,
            second_name: u.second_name,
            provider: u.provider,
        }
    }
}

/// Response for GET /auth/me — a status payload, not an error body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub is_authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

// ============================================================================
// Validation
// ============================================================================

/// Normalize and validate a signup/login payload.
///
/// Returns the normalized login. Errors name the offending field.
fn validate_credentials(login: &str, password: &str) -> Result<String, AppError> {
    let login = login.trim().to_lowercase();

    // Email shape: something@domain.tld
    let valid_email = login
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid_email {
        return Err(AppError::BadRequest(
            "login must be a valid email address".to_string(),
        ));
    }

    if password.len() < 8 {
        return Err(AppError::BadRequest(
            "password must be at least 8 characters".to_string(),
        ));
    }

    Ok(login)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/signup — Create a new password identity.
///
/// Validates the payload, hashes the password off the async workers and
/// persists the identity. Does NOT issue a session — login is a separate
/// step. The store's unique constraint decides duplicate races.
pub async fn signup(
    State(state): State<SharedState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let login = validate_credentials(&req.login, &req.password)?;

    // bcrypt is intentionally expensive — keep it off the async workers
    let cost = state.auth.bcrypt_cost;
    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(&password, cost))
        .await
        .map_err(|e| AppError::Internal(anyhow!("hash task failed: {}", e)))?
        .map_err(|e| AppError::Internal(anyhow!("Failed to hash password: {}", e)))?;

    let user = state
        .store
        .create_user(NewUser {
            login,
            name: None,
            second_name: None,
            password_hash: Some(password_hash),
            provider: AuthProvider::Password,
        })
        .await
        .map_err(|e| match e {
            StoreError::Duplicate(_) => AppError::BadRequest("User already exists".to_string()),
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, "user created");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully".to_string(),
            user: IdentitySummary {
                id: user.id,
                login: user.login,
            },
        }),
    ))
}

/// POST /auth/login — Verify credentials and set the session cookie.
///
/// Security: unknown login, wrong password and federated (passwordless)
/// identities all produce the exact same response, so callers cannot
/// enumerate users.
pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<([(header::HeaderName, header::HeaderValue); 1], Json<MessageResponse>), AppError> {
    let login = validate_credentials(&req.login, &req.password)?;

    let invalid_credentials = || AppError::BadRequest("Invalid credentials".to_string());

    let user = state
        .store
        .get_user_by_login(&login)
        .await?
        .ok_or_else(invalid_credentials)?;

    let hash = user.password_hash.clone().ok_or_else(invalid_credentials)?;

    let password = req.password;
    let password_ok =
        tokio::task::spawn_blocking(move || bcrypt::verify(&password, &hash).unwrap_or(false))
            .await
            .map_err(|e| AppError::Internal(anyhow!("verify task failed: {}", e)))?;

    if !password_ok {
        return Err(invalid_credentials());
    }

    let token = encode_jwt(user.id, &state.auth.jwt_secret, state.auth.token_ttl_secs)?;
    let cookie = build_session_cookie(
        &token,
        state.auth.token_ttl_secs,
        state.auth.secure_cookies(),
    );

    tracing::info!(user_id = %user.id, "login successful");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse {
            message: "Login successful".to_string(),
        }),
    ))
}

/// POST /auth/logout — Clear the session cookie.
///
/// Always succeeds, whether or not a session existed. The token string
/// itself stays valid until expiry; only the cookie is removed.
pub async fn logout(
    State(state): State<SharedState>,
) -> ([(header::HeaderName, header::HeaderValue); 1], Json<MessageResponse>) {
    let cookie = build_clear_cookie(state.auth.secure_cookies());
    (
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}

/// GET /auth/me — Session introspection.
///
/// A valid cookie whose subject still exists → 200 with the sanitized
/// user. Anything else (no cookie, invalid/expired token, deleted user) →
/// 401 with an explicit "not authenticated" payload instead of an error.
pub async fn me(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<MeResponse>), AppError> {
    let unauthenticated = (
        StatusCode::UNAUTHORIZED,
        Json(MeResponse {
            is_authenticated: false,
            user: None,
        }),
    );

    let Some(token) = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_session_token)
    else {
        return Ok(unauthenticated);
    };

    let Ok(claims) = decode_jwt(&token, &state.auth.jwt_secret) else {
        return Ok(unauthenticated);
    };

    let Ok(user_id) = claims.sub.parse::<Uuid>() else {
        return Ok(unauthenticated);
    };

    // A valid token for a since-deleted identity is still unauthenticated
    let Some(user) = state.store.get_user_by_id(user_id).await? else {
        return Ok(unauthenticated);
    };

    Ok((
        StatusCode::OK,
        Json(MeResponse {
            is_authenticated: true,
            user: Some(UserResponse::from(user)),
        }),
    ))
}

/// GET /auth/google — Redirect the user agent to Google's consent screen.
pub async fn google_login(State(state): State<SharedState>) -> Result<Redirect, AppError> {
    let google = state
        .auth
        .google
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Google sign-in is not configured".to_string()))?;

    let client = GoogleOAuthClient::new(google);
    Ok(Redirect::to(&client.auth_url()))
}

/// GET /auth/google/callback — Finish the federation handshake.
///
/// Three steps, each independent of the live provider past the first:
/// 1. Provider exchange: code → verified profile (401 if the handshake
///    did not complete — no cookie is set)
/// 2. Local identity resolution: find by email, create a passwordless
///    identity on first login
/// 3. Session issuance: exactly the password-login tail, then a redirect
///    back to the frontend
pub async fn google_callback(
    State(state): State<SharedState>,
    Query(query): Query<GoogleCallbackQuery>,
) -> Result<([(header::HeaderName, header::HeaderValue); 1], Redirect), AppError> {
    let google = state
        .auth
        .google
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Google sign-in is not configured".to_string()))?;

    if query.error.is_some() {
        return Err(AppError::Unauthorized("Authentication failed".to_string()));
    }
    let code = query
        .code
        .ok_or_else(|| AppError::Unauthorized("Authentication failed".to_string()))?;

    // 1. Provider exchange
    let client = GoogleOAuthClient::new(google);
    let profile = client.exchange_code(&code).await.map_err(|e| {
        tracing::warn!("Google code exchange failed: {:#}", e);
        AppError::Unauthorized("Authentication failed".to_string())
    })?;

    // 2. Local identity resolution
    let login = profile.email.trim().to_lowercase();
    let user = match state.store.get_user_by_login(&login).await? {
        Some(user) => user,
        None => {
            let created = state
                .store
                .create_user(NewUser {
                    login: login.clone(),
                    name: Some(profile.name.clone()),
                    second_name: None,
                    password_hash: None,
                    provider: AuthProvider::Google,
                })
                .await;
            match created {
                Ok(user) => user,
                // Lost a creation race — the identity exists now, use it
                Err(StoreError::Duplicate(_)) => state
                    .store
                    .get_user_by_login(&login)
                    .await?
                    .ok_or_else(|| AppError::Internal(anyhow!("user vanished after create race")))?,
                Err(other) => return Err(other.into()),
            }
        }
    };

    // 3. Session issuance — same as the password login tail
    let token = encode_jwt(user.id, &state.auth.jwt_secret, state.auth.token_ttl_secs)?;
    let cookie = build_session_cookie(
        &token,
        state.auth.token_ttl_secs,
        state.auth.secure_cookies(),
    );

    tracing::info!(user_id = %user.id, "google federation login");

    let frontend = state.auth.frontend_url.as_deref().unwrap_or("/");
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(frontend)))
}

// ============================================================================
// Tests
// ============================================================================
