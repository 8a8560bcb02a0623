//! JWT session token encoding and decoding using HS256.
//!
//! The token IS the session: subject id plus issue/expiry timestamps,
//! signed with the process-wide secret. Nothing is persisted server-side
//! and nothing is revoked — expiry is the only termination besides the
//! client deleting its cookie.

use anyhow::{Context, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// JWT claims payload — the subject identifier and the validity window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — user UUID
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Why verification failed.
///
/// Purely cryptographic/temporal — never a business-logic failure. Both
/// variants surface as the same 401 at the HTTP boundary so a client cannot
/// probe which check rejected its token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("malformed token or invalid signature")]
    Malformed,
}

/// Encode a session token for the given user.
///
/// Uses HS256 signing with the provided secret; expiry = now + ttl.
pub fn encode_jwt(user_id: Uuid, secret: &str, ttl_secs: u64) -> Result<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + ttl_secs as i64,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("Failed to encode JWT")
}

/// Decode and validate a session token.
///
/// Returns the claims if the token parses, the signature matches and the
/// expiry has not passed.
pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let token_data: TokenData<Claims> = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    })?;

    Ok(token_data.claims)
}

// ============================================================================
// Tests
// ============================================================================
