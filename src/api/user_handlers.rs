//! User administration route handlers — all behind the auth gate.
//!
//! Every response goes through the sanitized `UserResponse`; password
//! hashes never cross the API boundary.

use crate::api::handlers::{AppError, SharedState};
use crate::store::{PoiStore, UpdateUser};
use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use super::auth_handlers::{MessageResponse, UserResponse};

/// GET /api/users — list all users
pub async fn list_users(
    State(state): State<SharedState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state.store.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /api/users/{id} — fetch one user
pub async fn get_user(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .store
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}

/// PUT /api/users/{id} — update display fields (name / second name).
///
/// Login and credential material are not updatable through this route.
pub async fn update_user(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUser>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .store
        .update_user(id, req)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}

/// DELETE /api/users/{id} — delete a user.
///
/// Outstanding session tokens for the deleted user stay cryptographically
/// valid until expiry, but `/auth/me` reports them unauthenticated.
pub async fn delete_user(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.store.delete_user(id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "User deleted".to_string(),
    }))
}

// ============================================================================
// Tests
// ============================================================================
