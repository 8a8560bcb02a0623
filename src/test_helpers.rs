//! Test helper factories and mock state builders
#![allow(dead_code)]

use crate::api::handlers::{ServerState, SharedState};
use crate::store::mock::MockPoiStore;
use crate::{AuthConfig, GoogleConfig};
use std::sync::Arc;

/// Signing secret used across unit tests (32+ chars)
pub const TEST_SECRET: &str = "test-secret-key-minimum-32-chars!!";

/// Auth config with a fast bcrypt cost for tests
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: TEST_SECRET.to_string(),
        token_ttl_secs: 3600,
        bcrypt_cost: 4, // minimum cost, keeps the test suite fast
        frontend_url: Some("http://localhost:5173".to_string()),
        google: None,
    }
}

/// Auth config with Google federation configured
pub fn test_auth_config_with_google() -> AuthConfig {
    AuthConfig {
        google: Some(GoogleConfig {
            client_id: "test-id.apps.googleusercontent.com".to_string(),
            client_secret: "test-secret".to_string(),
            redirect_uri: "http://localhost:5000/auth/google/callback".to_string(),
        }),
        ..test_auth_config()
    }
}

/// Server state over an empty in-memory store
pub fn mock_state() -> SharedState {
    mock_state_with(MockPoiStore::new())
}

/// Server state over a pre-seeded in-memory store
pub fn mock_state_with(store: MockPoiStore) -> SharedState {
    Arc::new(ServerState {
        store: Arc::new(store),
        auth: test_auth_config(),
    })
}

/// Server state with a custom auth config
pub fn mock_state_with_auth(auth: AuthConfig) -> SharedState {
    Arc::new(ServerState {
        store: Arc::new(MockPoiStore::new()),
        auth,
    })
}
