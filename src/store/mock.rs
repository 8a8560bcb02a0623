//! In-memory mock implementation of PoiStore for testing.
//!
//! Uses `tokio::sync::RwLock<HashMap<K, V>>` collections. Uniqueness checks
//! happen under a single write lock, so the mock gives the same
//! exactly-one-winner guarantee as the Neo4j constraints.

use crate::store::models::*;
use crate::store::traits::{PoiStore, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory mock implementation of PoiStore.
#[derive(Default)]
pub struct MockPoiStore {
    pub users: RwLock<HashMap<Uuid, User>>,
    pub placemarks: RwLock<HashMap<Uuid, Placemark>>,
    pub categories: RwLock<HashMap<Uuid, Category>>,
    pub poi_types: RwLock<HashMap<Uuid, PoiType>>,
    pub views: RwLock<HashMap<(Uuid, NaiveDate), i64>>,
}

impl MockPoiStore {
    /// Create a new empty MockPoiStore.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PoiStore for MockPoiStore {
    // ========================================================================
    // Users
    // ========================================================================

    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.login == new_user.login) {
            return Err(StoreError::Duplicate("login"));
        }

        let user = User {
            id: Uuid::new_v4(),
            login: new_user.login,
            name: new_user.name,
            second_name: new_user.second_name,
            password_hash: new_user.password_hash,
            provider: new_user.provider,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn get_user_by_login(&self, login: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.login == login)
            .cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn update_user(&self, id: Uuid, update: UpdateUser) -> StoreResult<Option<User>> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            user.name = Some(name);
        }
        if let Some(second_name) = update.second_name {
            user.second_name = Some(second_name);
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }

    // ========================================================================
    // Placemarks
    // ========================================================================

    async fn create_placemark(&self, new: NewPlacemark) -> StoreResult<Placemark> {
        let now = Utc::now();
        let placemark = Placemark {
            id: Uuid::new_v4(),
            name: new.name,
            title: new.title,
            description: new.description,
            poi_type: new.poi_type,
            categories: new.categories,
            location: new.location,
            views: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.placemarks
            .write()
            .await
            .insert(placemark.id, placemark.clone());
        Ok(placemark)
    }

    async fn get_placemark(&self, id: Uuid) -> StoreResult<Option<Placemark>> {
        let Some(mut placemark) = self.placemarks.read().await.get(&id).cloned() else {
            return Ok(None);
        };
        placemark.views = self.views_for(id).await;
        Ok(Some(placemark))
    }

    async fn list_placemarks(&self) -> StoreResult<Vec<Placemark>> {
        let mut placemarks: Vec<Placemark> =
            self.placemarks.read().await.values().cloned().collect();
        placemarks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        for placemark in &mut placemarks {
            placemark.views = self.views_for(placemark.id).await;
        }
        Ok(placemarks)
    }

    async fn update_placemark(
        &self,
        id: Uuid,
        update: UpdatePlacemark,
    ) -> StoreResult<Option<Placemark>> {
        let mut placemarks = self.placemarks.write().await;
        let Some(placemark) = placemarks.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            placemark.name = name;
        }
        if let Some(title) = update.title {
            placemark.title = Some(title);
        }
        if let Some(description) = update.description {
            placemark.description = Some(description);
        }
        if let Some(categories) = update.categories {
            placemark.categories = categories;
        }
        if let Some(location) = update.location {
            placemark.location = location;
        }
        placemark.updated_at = Utc::now();
        let mut updated = placemark.clone();
        drop(placemarks);
        updated.views = self.views_for(id).await;
        Ok(Some(updated))
    }

    async fn delete_placemark(&self, id: Uuid) -> StoreResult<bool> {
        self.views
            .write()
            .await
            .retain(|(pid, _), _| *pid != id);
        Ok(self.placemarks.write().await.remove(&id).is_some())
    }

    async fn record_view(&self, id: Uuid, date: NaiveDate) -> StoreResult<()> {
        *self.views.write().await.entry((id, date)).or_insert(0) += 1;
        Ok(())
    }

    // ========================================================================
    // Categories
    // ========================================================================

    async fn create_category(&self, name: &str) -> StoreResult<Category> {
        let mut categories = self.categories.write().await;
        if categories.values().any(|c| c.name == name) {
            return Err(StoreError::Duplicate("name"));
        }
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let mut categories: Vec<Category> =
            self.categories.read().await.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn delete_category(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.categories.write().await.remove(&id).is_some())
    }

    // ========================================================================
    // POI types
    // ========================================================================

    async fn create_poi_type(&self, name: &str) -> StoreResult<PoiType> {
        let mut poi_types = self.poi_types.write().await;
        if poi_types.values().any(|t| t.name == name) {
            return Err(StoreError::Duplicate("name"));
        }
        let poi_type = PoiType {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        poi_types.insert(poi_type.id, poi_type.clone());
        Ok(poi_type)
    }

    async fn get_poi_type(&self, id: Uuid) -> StoreResult<Option<PoiType>> {
        Ok(self.poi_types.read().await.get(&id).cloned())
    }

    async fn list_poi_types(&self) -> StoreResult<Vec<PoiType>> {
        let mut types: Vec<PoiType> = self.poi_types.read().await.values().cloned().collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }

    async fn delete_poi_type(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.poi_types.write().await.remove(&id).is_some())
    }

    // ========================================================================
    // Health
    // ========================================================================

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }
}

impl MockPoiStore {
    async fn views_for(&self, id: Uuid) -> Vec<DailyViews> {
        let views = self.views.read().await;
        let mut buckets: Vec<DailyViews> = views
            .iter()
            .filter(|((pid, _), _)| *pid == id)
            .map(|((_, date), count)| DailyViews {
                date: *date,
                count: *count,
            })
            .collect();
        buckets.sort_by_key(|v| v.date);
        buckets
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn new_password_user(login: &str) -> NewUser {
        NewUser {
            login: login.to_string(),
            name: None,
            second_name: None,
            password_hash: Some("$2b$10$fakehash".to_string()),
            provider: AuthProvider::Password,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup_user() {
        let store = MockPoiStore::new();
        let user = store
            .create_user(new_password_user("a@b.com"))
            .await
            .unwrap();

        let by_id = store.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.login, "a@b.com");

        let by_login = store.get_user_by_login("a@b.com").await.unwrap().unwrap();
        assert_eq!(by_login.id, user.id);

        assert!(store
            .get_user_by_login("missing@b.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_login_rejected() {
        let store = MockPoiStore::new();
        store
            .create_user(new_password_user("a@b.com"))
            .await
            .unwrap();

        let err = store
            .create_user(new_password_user("a@b.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("login")));
    }

    #[tokio::test]
    async fn test_update_and_delete_user() {
        let store = MockPoiStore::new();
        let user = store
            .create_user(new_password_user("a@b.com"))
            .await
            .unwrap();

        let updated = store
            .update_user(
                user.id,
                UpdateUser {
                    name: Some("Ada".into()),
                    second_name: None,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name.as_deref(), Some("Ada"));
        assert!(updated.second_name.is_none());

        assert!(store.delete_user(user.id).await.unwrap());
        assert!(!store.delete_user(user.id).await.unwrap());
        assert!(store.get_user_by_id(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_view_buckets_by_day() {
        let store = MockPoiStore::new();
        let placemark = store
            .create_placemark(NewPlacemark {
                name: "Fountain".into(),
                title: None,
                description: None,
                poi_type: Uuid::new_v4(),
                categories: vec![],
                location: Location {
                    longitude: 30.52,
                    latitude: 50.45,
                },
            })
            .await
            .unwrap();

        let day1 = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let day2 = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        store.record_view(placemark.id, day1).await.unwrap();
        store.record_view(placemark.id, day1).await.unwrap();
        store.record_view(placemark.id, day2).await.unwrap();

        let fetched = store.get_placemark(placemark.id).await.unwrap().unwrap();
        assert_eq!(
            fetched.views,
            vec![
                DailyViews { date: day1, count: 2 },
                DailyViews { date: day2, count: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn test_category_and_type_uniqueness() {
        let store = MockPoiStore::new();
        store.create_category("parks").await.unwrap();
        assert!(matches!(
            store.create_category("parks").await.unwrap_err(),
            StoreError::Duplicate("name")
        ));

        store.create_poi_type("museum").await.unwrap();
        assert!(matches!(
            store.create_poi_type("museum").await.unwrap_err(),
            StoreError::Duplicate("name")
        ));
    }
}
