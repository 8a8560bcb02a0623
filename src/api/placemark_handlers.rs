//! Placemark, category and POI-type route handlers.
//!
//! Reads are public; every mutation is gated by the `AuthUser` extractor
//! (these paths mix public and protected methods, so the gate runs
//! per-handler rather than as a router layer). Fetching a single placemark
//! records a per-day view count.

use crate::api::handlers::{AppError, SharedState};
use crate::auth::extractor::AuthUser;
use crate::store::{
    Category, NewPlacemark, Placemark, PoiStore, PoiType, StoreError, UpdatePlacemark,
};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::auth_handlers::MessageResponse;

/// Request body for creating a category or POI type
#[derive(Debug, Deserialize)]
pub struct CreateNamedRequest {
    pub name: String,
}

// ============================================================================
// Placemarks
// ============================================================================

/// GET /api/placemarks — list all placemarks, newest first
pub async fn list_placemarks(
    State(state): State<SharedState>,
) -> Result<Json<Vec<Placemark>>, AppError> {
    Ok(Json(state.store.list_placemarks().await?))
}

/// GET /api/placemarks/{id} — fetch one placemark and record a view.
///
/// The view bucket for today is incremented (created on first view of the
/// day). The returned document carries the counts as of before this fetch.
pub async fn get_placemark(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Placemark>, AppError> {
    let placemark = state
        .store
        .get_placemark(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Placemark not found".to_string()))?;

    let today = chrono::Utc::now().date_naive();
    state.store.record_view(id, today).await?;

    Ok(Json(placemark))
}

/// POST /api/placemarks — create a placemark (auth required)
pub async fn create_placemark(
    State(state): State<SharedState>,
    _user: AuthUser,
    Json(req): Json<NewPlacemark>,
) -> Result<(StatusCode, Json<Placemark>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }
    if !req.location.is_valid() {
        return Err(AppError::BadRequest(
            "location out of range: longitude must be in [-180, 180], latitude in [-90, 90]"
                .to_string(),
        ));
    }

    // The referenced type must exist
    if state.store.get_poi_type(req.poi_type).await?.is_none() {
        return Err(AppError::BadRequest("unknown POI type".to_string()));
    }

    let placemark = state.store.create_placemark(req).await?;
    tracing::info!(placemark_id = %placemark.id, "placemark created");

    Ok((StatusCode::CREATED, Json(placemark)))
}

/// PUT /api/placemarks/{id} — partial update (auth required)
pub async fn update_placemark(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    _user: AuthUser,
    Json(req): Json<UpdatePlacemark>,
) -> Result<Json<Placemark>, AppError> {
    if let Some(ref name) = req.name {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("name must not be empty".to_string()));
        }
    }
    if let Some(location) = req.location {
        if !location.is_valid() {
            return Err(AppError::BadRequest(
                "location out of range: longitude must be in [-180, 180], latitude in [-90, 90]"
                    .to_string(),
            ));
        }
    }

    let placemark = state
        .store
        .update_placemark(id, req)
        .await?
        .ok_or_else(|| AppError::NotFound("Placemark not found".to_string()))?;

    Ok(Json(placemark))
}

/// DELETE /api/placemarks/{id} — delete a placemark (auth required)
pub async fn delete_placemark(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    _user: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.store.delete_placemark(id).await? {
        return Err(AppError::NotFound("Placemark not found".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "Placemark deleted".to_string(),
    }))
}

// ============================================================================
// Categories
// ============================================================================

/// GET /api/categories — list all categories
pub async fn list_categories(
    State(state): State<SharedState>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(state.store.list_categories().await?))
}

/// POST /api/categories — create a category (auth required)
pub async fn create_category(
    State(state): State<SharedState>,
    _user: AuthUser,
    Json(req): Json<CreateNamedRequest>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }

    let category = state.store.create_category(name).await.map_err(|e| match e {
        StoreError::Duplicate(_) => AppError::BadRequest("Category already exists".to_string()),
        other => other.into(),
    })?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// DELETE /api/categories/{id} — delete a category (auth required)
pub async fn delete_category(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    _user: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.store.delete_category(id).await? {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "Category deleted".to_string(),
    }))
}

// ============================================================================
// POI types
// ============================================================================

/// GET /api/types — list all POI types
pub async fn list_poi_types(
    State(state): State<SharedState>,
) -> Result<Json<Vec<PoiType>>, AppError> {
    Ok(Json(state.store.list_poi_types().await?))
}

/// POST /api/types — create a POI type (auth required)
pub async fn create_poi_type(
    State(state): State<SharedState>,
    _user: AuthUser,
    Json(req): Json<CreateNamedRequest>,
) -> Result<(StatusCode, Json<PoiType>), AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }

    let poi_type = state.store.create_poi_type(name).await.map_err(|e| match e {
        StoreError::Duplicate(_) => AppError::BadRequest("Type already exists".to_string()),
        other => other.into(),
    })?;

    Ok((StatusCode::CREATED, Json(poi_type)))
}

/// DELETE /api/types/{id} — delete a POI type (auth required)
pub async fn delete_poi_type(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    _user: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.store.delete_poi_type(id).await? {
        return Err(AppError::NotFound("Type not found".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "Type deleted".to_string(),
    }))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::encode_jwt;
    use crate::test_helpers::{mock_state, TEST_SECRET};
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt; // oneshot

    /// Router mirroring the real shape: public reads, extractor-gated mutations
    fn test_app(state: SharedState) -> Router {
        Router::new()
            .route(
                "/api/placemarks",
                get(list_placemarks).post(create_placemark),
            )
            .route(
                "/api/placemarks/{id}",
                get(get_placemark)
                    .put(update_placemark)
                    .delete(delete_placemark),
            )
            .route("/api/categories", get(list_categories).post(create_category))
            .route(
                "/api/categories/{id}",
                axum::routing::delete(delete_category),
            )
            .route("/api/types", get(list_poi_types).post(create_poi_type))
            .route("/api/types/{id}", axum::routing::delete(delete_poi_type))
            .with_state(state)
    }

    fn auth_cookie() -> String {
        let token = encode_jwt(Uuid::new_v4(), TEST_SECRET, 3600).unwrap();
        format!("auth_token={}", token)
    }

    fn post_json(uri: &str, value: serde_json::Value, cookie: Option<&str>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        builder.body(Body::from(value.to_string())).unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn seed_poi_type(state: &SharedState, name: &str) -> Uuid {
        state.store.create_poi_type(name).await.unwrap().id
    }

    fn placemark_body(poi_type: Uuid) -> serde_json::Value {
        serde_json::json!({
            "name": "Golden Gate",
            "poi_type": poi_type,
            "location": { "longitude": -122.4783, "latitude": 37.8199 }
        })
    }

    #[tokio::test]
    async fn test_create_placemark_requires_auth() {
        let state = mock_state();
        let poi_type = seed_poi_type(&state, "bridge").await;
        let app = test_app(state);

        let resp = app
            .oneshot(post_json("/api/placemarks", placemark_body(poi_type), None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_and_fetch_placemark() {
        let state = mock_state();
        let poi_type = seed_poi_type(&state, "bridge").await;
        let app = test_app(state);
        let cookie = auth_cookie();

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/placemarks",
                placemark_body(poi_type),
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created = body_json(resp).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["name"], "Golden Gate");

        // Public read
        let resp = app
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .uri(format!("/api/placemarks/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        // The fetch above recorded a view — visible on the next fetch
        let resp = app
            .oneshot(
                HttpRequest::builder()
                    .uri(format!("/api/placemarks/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["views"][0]["count"], 1);
    }

    #[tokio::test]
    async fn test_create_placemark_validation() {
        let state = mock_state();
        let poi_type = seed_poi_type(&state, "bridge").await;
        let app = test_app(state);
        let cookie = auth_cookie();

        // Out-of-range coordinates
        let mut body = placemark_body(poi_type);
        body["location"]["latitude"] = serde_json::json!(123.0);
        let resp = app
            .clone()
            .oneshot(post_json("/api/placemarks", body, Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        // Empty name
        let mut body = placemark_body(poi_type);
        body["name"] = serde_json::json!("   ");
        let resp = app
            .clone()
            .oneshot(post_json("/api/placemarks", body, Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        // Unknown POI type
        let body = placemark_body(Uuid::new_v4());
        let resp = app
            .oneshot(post_json("/api/placemarks", body, Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_and_delete_placemark() {
        let state = mock_state();
        let poi_type = seed_poi_type(&state, "bridge").await;
        let app = test_app(state);
        let cookie = auth_cookie();

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/placemarks",
                placemark_body(poi_type),
                Some(&cookie),
            ))
            .await
            .unwrap();
        let id = body_json(resp).await["id"].as_str().unwrap().to_string();

        // Update the name only
        let resp = app
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .method("PUT")
                    .uri(format!("/api/placemarks/{}", id))
                    .header("content-type", "application/json")
                    .header("cookie", &cookie)
                    .body(Body::from(
                        serde_json::json!({"name": "Golden Gate Bridge"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["name"], "Golden Gate Bridge");
        // Untouched fields survive
        assert!((json["location"]["latitude"].as_f64().unwrap() - 37.8199).abs() < 1e-9);

        // Delete
        let resp = app
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .method("DELETE")
                    .uri(format!("/api/placemarks/{}", id))
                    .header("cookie", &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        // Gone now
        let resp = app
            .oneshot(
                HttpRequest::builder()
                    .uri(format!("/api/placemarks/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_category_crud_and_duplicates() {
        let app = test_app(mock_state());
        let cookie = auth_cookie();

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/categories",
                serde_json::json!({"name": "parks"}),
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let id = body_json(resp).await["id"].as_str().unwrap().to_string();

        // Duplicate name → 400
        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/categories",
                serde_json::json!({"name": "parks"}),
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        // Public listing
        let resp = app
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .uri("/api/categories")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json.as_array().unwrap().len(), 1);

        // Delete (gated)
        let resp = app
            .oneshot(
                HttpRequest::builder()
                    .method("DELETE")
                    .uri(format!("/api/categories/{}", id))
                    .header("cookie", &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_poi_type_listing_is_public() {
        let state = mock_state();
        seed_poi_type(&state, "museum").await;
        let app = test_app(state);

        let resp = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/api/types")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json[0]["name"], "museum");
    }
}
