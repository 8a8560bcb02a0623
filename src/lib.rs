//! Placemark Server
//!
//! A REST backend for a points-of-interest mapping application:
//! - Placemark, category and POI-type CRUD backed by Neo4j
//! - Cookie-based JWT sessions (signup / login / logout / introspection)
//! - Google OAuth federation issuing the same local sessions
//!
//! The auth lifecycle is stateless: a signed HS256 token in an HttpOnly
//! cookie, re-verified on every request. No server-side session store.

pub mod api;
pub mod auth;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub neo4j: Neo4jYamlConfig,
    /// Auth section — may be completed/overridden by env vars, but the
    /// resolved config must carry a usable signing secret or startup fails.
    pub auth: Option<AuthConfig>,
}

/// Server configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub port: u16,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self { port: 5000 }
    }
}

/// Neo4j configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Neo4jYamlConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for Neo4jYamlConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".into(),
            user: "neo4j".into(),
            password: "placemark123".into(),
        }
    }
}

/// Authentication configuration.
///
/// The signing secret has no default and no fallback literal: a process
/// without a configured secret refuses to start.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT signing secret (HS256, minimum 32 characters)
    pub jwt_secret: String,
    /// Session token lifetime in seconds (default: 3600 = 1h)
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
    /// bcrypt work factor for password hashing (default: 10)
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    /// Frontend origin, used for CORS, the post-OAuth redirect, and for
    /// deriving the cookie `Secure` flag (https scheme → Secure)
    pub frontend_url: Option<String>,
    /// Google OAuth — absent means the federation endpoints report 401
    pub google: Option<GoogleConfig>,
}

/// Google OAuth2 client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Redirect URI registered with Google (the /auth/google/callback route)
    pub redirect_uri: String,
}

fn default_token_ttl() -> u64 {
    3600 // 1 hour
}

fn default_bcrypt_cost() -> u32 {
    10
}

impl AuthConfig {
    /// Whether session cookies should carry the `Secure` flag.
    pub fn secure_cookies(&self) -> bool {
        crate::auth::cookie::should_set_secure(self.frontend_url.as_deref())
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from environment variables only.
    /// Equivalent to `from_yaml_and_env(None)`.
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with
    /// env vars. Priority: env var > YAML > default.
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD; a missing file
    /// falls back to env vars / defaults. Fails when no usable signing
    /// secret is configured anywhere.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        let auth = Self::resolve_auth(yaml.auth)?;

        Ok(Self {
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.server.port),
            neo4j_uri: std::env::var("NEO4J_URI").unwrap_or(yaml.neo4j.uri),
            neo4j_user: std::env::var("NEO4J_USER").unwrap_or(yaml.neo4j.user),
            neo4j_password: std::env::var("NEO4J_PASSWORD").unwrap_or(yaml.neo4j.password),
            auth,
        })
    }

    /// Apply env overrides to the auth section and validate the secret.
    fn resolve_auth(yaml_auth: Option<AuthConfig>) -> Result<AuthConfig> {
        let mut auth = yaml_auth.unwrap_or_else(|| AuthConfig {
            token_ttl_secs: default_token_ttl(),
            bcrypt_cost: default_bcrypt_cost(),
            ..AuthConfig::default()
        });

        if let Ok(secret) = std::env::var("JWT_SECRET") {
            auth.jwt_secret = secret;
        }
        if let Ok(url) = std::env::var("FRONTEND_URL") {
            auth.frontend_url = Some(url);
        }

        // Google credentials from env replace (or create) the YAML section
        if let (Ok(client_id), Ok(client_secret), Ok(redirect_uri)) = (
            std::env::var("GOOGLE_CLIENT_ID"),
            std::env::var("GOOGLE_CLIENT_SECRET"),
            std::env::var("GOOGLE_REDIRECT_URI"),
        ) {
            auth.google = Some(GoogleConfig {
                client_id,
                client_secret,
                redirect_uri,
            });
        }

        if auth.jwt_secret.len() < 32 {
            bail!(
                "auth.jwt_secret (or JWT_SECRET) must be set to at least 32 characters — \
                 refusing to start without a signing secret"
            );
        }

        Ok(auth)
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

// ============================================================================
// Server entry point
// ============================================================================

/// Connect to the store, build the router and serve until shutdown.
pub async fn start_server(config: Config) -> Result<()> {
    let store = Arc::new(
        store::Neo4jClient::new(&config.neo4j_uri, &config.neo4j_user, &config.neo4j_password)
            .await?,
    );

    let state = Arc::new(api::handlers::ServerState {
        store,
        auth: config.auth.clone(),
    });

    let app = api::create_router(state);

    let address = format!("0.0.0.0:{}", config.server_port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!("Server running on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        tracing::info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

// ============================================================================
// Tests
// ============================================================================
