//! PoiStore trait definition
//!
//! Abstract interface over the document store. Mirrored by `Neo4jClient`
//! and by the in-memory mock used in tests.

use crate::store::models::*;
use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// Store-level error.
///
/// `Duplicate` is the typed surface of a uniqueness-constraint violation —
/// the arbiter for concurrent signups racing on one login. Everything else
/// is an unexpected backend failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate value for unique field `{0}`")]
    Duplicate(&'static str),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Abstract interface for all store operations.
#[async_trait]
pub trait PoiStore: Send + Sync {
    // ========================================================================
    // Users
    // ========================================================================

    /// Create a user. Fails with `StoreError::Duplicate` when the login is
    /// already taken — the store's unique constraint, not a pre-check, makes
    /// this safe under concurrency.
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User>;

    /// Get a user by internal id
    async fn get_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Get a user by login (exact match; logins are stored lowercase)
    async fn get_user_by_login(&self, login: &str) -> StoreResult<Option<User>>;

    /// List all users
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Update a user's display fields. Returns None when the user is unknown.
    async fn update_user(&self, id: Uuid, update: UpdateUser) -> StoreResult<Option<User>>;

    /// Delete a user. Returns false when the user is unknown.
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;

    // ========================================================================
    // Placemarks
    // ========================================================================

    /// Create a placemark
    async fn create_placemark(&self, new: NewPlacemark) -> StoreResult<Placemark>;

    /// Get a placemark with its view history
    async fn get_placemark(&self, id: Uuid) -> StoreResult<Option<Placemark>>;

    /// List all placemarks, newest first
    async fn list_placemarks(&self) -> StoreResult<Vec<Placemark>>;

    /// Partially update a placemark. Returns None when unknown.
    async fn update_placemark(
        &self,
        id: Uuid,
        update: UpdatePlacemark,
    ) -> StoreResult<Option<Placemark>>;

    /// Delete a placemark and its view history. Returns false when unknown.
    async fn delete_placemark(&self, id: Uuid) -> StoreResult<bool>;

    /// Increment the placemark's view bucket for the given day
    async fn record_view(&self, id: Uuid, date: NaiveDate) -> StoreResult<()>;

    // ========================================================================
    // Categories
    // ========================================================================

    /// Create a category (unique name)
    async fn create_category(&self, name: &str) -> StoreResult<Category>;

    /// List all categories
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;

    /// Delete a category. Returns false when unknown.
    async fn delete_category(&self, id: Uuid) -> StoreResult<bool>;

    // ========================================================================
    // POI types
    // ========================================================================

    /// Create a POI type (unique name)
    async fn create_poi_type(&self, name: &str) -> StoreResult<PoiType>;

    /// Get a POI type by id
    async fn get_poi_type(&self, id: Uuid) -> StoreResult<Option<PoiType>>;

    /// List all POI types
    async fn list_poi_types(&self) -> StoreResult<Vec<PoiType>>;

    /// Delete a POI type. Returns false when unknown.
    async fn delete_poi_type(&self, id: Uuid) -> StoreResult<bool>;

    // ========================================================================
    // Health
    // ========================================================================

    /// Whether the backing database answers queries
    async fn health_check(&self) -> StoreResult<bool>;
}
