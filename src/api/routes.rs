//! API route definitions

use super::handlers::{self, SharedState};
use super::{auth_handlers, placemark_handlers, user_handlers};
use crate::auth::middleware::require_auth;
use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the API router.
///
/// Three groups:
/// - public routes (health, the auth lifecycle, read-only POI data)
/// - mixed-method POI paths whose mutations are gated per-handler by the
///   `AuthUser` extractor
/// - the user administration group, wholly behind the `require_auth` layer
pub fn create_router(state: SharedState) -> Router {
    let cors = cors_layer(state.auth.frontend_url.as_deref());

    let users = Router::new()
        .route("/api/users", get(user_handlers::list_users))
        .route(
            "/api/users/{id}",
            get(user_handlers::get_user)
                .put(user_handlers::update_user)
                .delete(user_handlers::delete_user),
        )
        .layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // ====================================================================
        // Auth lifecycle
        // ====================================================================
        .route("/auth/signup", post(auth_handlers::signup))
        .route("/auth/login", post(auth_handlers::login))
        .route("/auth/logout", post(auth_handlers::logout))
        .route("/auth/me", get(auth_handlers::me))
        .route("/auth/google", get(auth_handlers::google_login))
        .route("/auth/google/callback", get(auth_handlers::google_callback))
        // ====================================================================
        // Placemarks (reads public, mutations extractor-gated)
        // ====================================================================
        .route(
            "/api/placemarks",
            get(placemark_handlers::list_placemarks).post(placemark_handlers::create_placemark),
        )
        .route(
            "/api/placemarks/{id}",
            get(placemark_handlers::get_placemark)
                .put(placemark_handlers::update_placemark)
                .delete(placemark_handlers::delete_placemark),
        )
        // Categories
        .route(
            "/api/categories",
            get(placemark_handlers::list_categories).post(placemark_handlers::create_category),
        )
        .route(
            "/api/categories/{id}",
            axum::routing::delete(placemark_handlers::delete_category),
        )
        // POI types
        .route(
            "/api/types",
            get(placemark_handlers::list_poi_types).post(placemark_handlers::create_poi_type),
        )
        .route(
            "/api/types/{id}",
            axum::routing::delete(placemark_handlers::delete_poi_type),
        )
        // Users (fully gated group)
        .merge(users)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the configured frontend origin.
///
/// Cookies require a concrete origin plus credentials; without a configured
/// frontend the layer stays permissive for local development (credentialed
/// requests are then same-origin anyway).
fn cors_layer(frontend_url: Option<&str>) -> CorsLayer {
    match frontend_url
        .map(|u| u.trim_end_matches('/'))
        .and_then(|u| u.parse::<HeaderValue>().ok())
    {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([CONTENT_TYPE])
            .allow_credentials(true),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    }
}

// ============================================================================
// Tests
// ============================================================================
