//! Neo4j-backed implementation of [`PoiStore`]

use crate::store::models::*;
use crate::store::traits::{PoiStore, StoreError, StoreResult};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use neo4rs::{query, Graph};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Client for Neo4j operations
pub struct Neo4jClient {
    graph: Arc<Graph>,
}

impl Neo4jClient {
    /// Create a new Neo4j client and initialize the schema
    pub async fn new(uri: &str, user: &str, password: &str) -> Result<Self> {
        let graph = Graph::new(uri, user, password)
            .await
            .context("Failed to connect to Neo4j")?;

        let client = Self {
            graph: Arc::new(graph),
        };

        client.init_schema().await?;

        Ok(client)
    }

    /// Initialize constraints and indexes.
    ///
    /// The login / name uniqueness constraints are what arbitrate concurrent
    /// creates: the loser of a race gets a constraint violation, mapped to
    /// `StoreError::Duplicate`.
    async fn init_schema(&self) -> Result<()> {
        let constraints = vec![
            "CREATE CONSTRAINT user_id IF NOT EXISTS FOR (u:User) REQUIRE u.id IS UNIQUE",
            "CREATE CONSTRAINT user_login IF NOT EXISTS FOR (u:User) REQUIRE u.login IS UNIQUE",
            "CREATE CONSTRAINT placemark_id IF NOT EXISTS FOR (p:Placemark) REQUIRE p.id IS UNIQUE",
            "CREATE CONSTRAINT category_id IF NOT EXISTS FOR (c:Category) REQUIRE c.id IS UNIQUE",
            "CREATE CONSTRAINT category_name IF NOT EXISTS FOR (c:Category) REQUIRE c.name IS UNIQUE",
            "CREATE CONSTRAINT poi_type_id IF NOT EXISTS FOR (t:PoiType) REQUIRE t.id IS UNIQUE",
            "CREATE CONSTRAINT poi_type_name IF NOT EXISTS FOR (t:PoiType) REQUIRE t.name IS UNIQUE",
        ];

        let indexes = vec![
            "CREATE INDEX placemark_type IF NOT EXISTS FOR (p:Placemark) ON (p.poi_type)",
            "CREATE INDEX view_day IF NOT EXISTS FOR (v:PlacemarkView) ON (v.placemark_id, v.date)",
        ];

        for stmt in constraints.into_iter().chain(indexes) {
            if let Err(e) = self.graph.run(query(stmt)).await {
                tracing::warn!("Schema statement failed ({}): {}", stmt, e);
            }
        }

        Ok(())
    }

    /// Map a write error to `Duplicate` when it is a uniqueness-constraint
    /// violation, otherwise pass it through as a backend error.
    fn map_write_err(e: neo4rs::Error, field: &'static str) -> StoreError {
        let msg = e.to_string();
        if msg.contains("ConstraintValidation") || msg.contains("already exists") {
            StoreError::Duplicate(field)
        } else {
            StoreError::Backend(anyhow!(e).context("Neo4j write failed"))
        }
    }

    /// Parse a Neo4j node into a User
    fn node_to_user(node: &neo4rs::Node) -> Result<User> {
        let provider = node
            .get::<String>("provider")?
            .parse::<AuthProvider>()
            .map_err(|e| anyhow!(e))?;

        Ok(User {
            id: node.get::<String>("id")?.parse()?,
            login: node.get("login")?,
            name: non_empty(node.get::<String>("name").ok()),
            second_name: non_empty(node.get::<String>("second_name").ok()),
            password_hash: non_empty(node.get::<String>("password_hash").ok()),
            provider,
            created_at: node
                .get::<String>("created_at")?
                .parse()
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    /// Parse a Neo4j node into a Placemark (views filled in separately)
    fn node_to_placemark(node: &neo4rs::Node) -> Result<Placemark> {
        let categories = node
            .get::<Vec<String>>("categories")
            .unwrap_or_default()
            .into_iter()
            .filter_map(|s| s.parse().ok())
            .collect();

        Ok(Placemark {
            id: node.get::<String>("id")?.parse()?,
            name: node.get("name")?,
            title: non_empty(node.get::<String>("title").ok()),
            description: non_empty(node.get::<String>("description").ok()),
            poi_type: node.get::<String>("poi_type")?.parse()?,
            categories,
            location: Location {
                longitude: node.get("longitude")?,
                latitude: node.get("latitude")?,
            },
            views: Vec::new(),
            created_at: node
                .get::<String>("created_at")?
                .parse()
                .unwrap_or_else(|_| Utc::now()),
            updated_at: node
                .get::<String>("updated_at")?
                .parse()
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    /// Fetch view buckets for a set of placemarks, grouped by placemark id
    async fn fetch_views(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<DailyViews>>> {
        let id_strings: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        let q = query(
            "MATCH (v:PlacemarkView) WHERE v.placemark_id IN $ids \
             RETURN v.placemark_id AS pid, v.date AS date, v.count AS count \
             ORDER BY v.date",
        )
        .param("ids", id_strings);

        let mut result = self.graph.execute(q).await?;
        let mut views: HashMap<Uuid, Vec<DailyViews>> = HashMap::new();
        while let Some(row) = result.next().await? {
            let pid: Uuid = row.get::<String>("pid")?.parse()?;
            let date: NaiveDate = row.get::<String>("date")?.parse()?;
            let count: i64 = row.get("count")?;
            views.entry(pid).or_default().push(DailyViews { date, count });
        }
        Ok(views)
    }
}

/// Empty strings are the store encoding of None
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

#[async_trait]
impl PoiStore for Neo4jClient {
    // ========================================================================
    // Users
    // ========================================================================

    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let user = User {
            id: Uuid::new_v4(),
            login: new_user.login,
            name: new_user.name,
            second_name: new_user.second_name,
            password_hash: new_user.password_hash,
            provider: new_user.provider,
            created_at: Utc::now(),
        };

        let q = query(
            "CREATE (u:User {id: $id, login: $login, name: $name, \
             second_name: $second_name, password_hash: $password_hash, \
             provider: $provider, created_at: $created_at})",
        )
        .param("id", user.id.to_string())
        .param("login", user.login.clone())
        .param("name", user.name.clone().unwrap_or_default())
        .param("second_name", user.second_name.clone().unwrap_or_default())
        .param("password_hash", user.password_hash.clone().unwrap_or_default())
        .param("provider", user.provider.to_string())
        .param("created_at", user.created_at.to_rfc3339());

        self.graph
            .run(q)
            .await
            .map_err(|e| Self::map_write_err(e, "login"))?;

        Ok(user)
    }

    async fn get_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let q = query("MATCH (u:User {id: $id}) RETURN u").param("id", id.to_string());

        let mut result = self.graph.execute(q).await.map_err(anyhow::Error::from)?;
        if let Some(row) = result.next().await.map_err(anyhow::Error::from)? {
            let node: neo4rs::Node = row.get("u").map_err(anyhow::Error::from)?;
            Ok(Some(Self::node_to_user(&node)?))
        } else {
            Ok(None)
        }
    }

    async fn get_user_by_login(&self, login: &str) -> StoreResult<Option<User>> {
        let q = query("MATCH (u:User {login: $login}) RETURN u").param("login", login);

        let mut result = self.graph.execute(q).await.map_err(anyhow::Error::from)?;
        if let Some(row) = result.next().await.map_err(anyhow::Error::from)? {
            let node: neo4rs::Node = row.get("u").map_err(anyhow::Error::from)?;
            Ok(Some(Self::node_to_user(&node)?))
        } else {
            Ok(None)
        }
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let q = query("MATCH (u:User) RETURN u ORDER BY u.created_at DESC");

        let mut result = self.graph.execute(q).await.map_err(anyhow::Error::from)?;
        let mut users = Vec::new();
        while let Some(row) = result.next().await.map_err(anyhow::Error::from)? {
            let node: neo4rs::Node = row.get("u").map_err(anyhow::Error::from)?;
            users.push(Self::node_to_user(&node)?);
        }
        Ok(users)
    }

    async fn update_user(&self, id: Uuid, update: UpdateUser) -> StoreResult<Option<User>> {
        let mut assignments = Vec::new();
        let mut q_str = String::from("MATCH (u:User {id: $id}) ");
        if update.name.is_some() {
            assignments.push("u.name = $name");
        }
        if update.second_name.is_some() {
            assignments.push("u.second_name = $second_name");
        }
        if !assignments.is_empty() {
            q_str.push_str("SET ");
            q_str.push_str(&assignments.join(", "));
            q_str.push(' ');
        }
        q_str.push_str("RETURN u");

        let q = query(&q_str)
            .param("id", id.to_string())
            .param("name", update.name.unwrap_or_default())
            .param("second_name", update.second_name.unwrap_or_default());

        let mut result = self.graph.execute(q).await.map_err(anyhow::Error::from)?;
        if let Some(row) = result.next().await.map_err(anyhow::Error::from)? {
            let node: neo4rs::Node = row.get("u").map_err(anyhow::Error::from)?;
            Ok(Some(Self::node_to_user(&node)?))
        } else {
            Ok(None)
        }
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let q = query("MATCH (u:User {id: $id}) DELETE u RETURN count(u) AS deleted")
            .param("id", id.to_string());

        let mut result = self.graph.execute(q).await.map_err(anyhow::Error::from)?;
        if let Some(row) = result.next().await.map_err(anyhow::Error::from)? {
            let deleted: i64 = row.get("deleted").map_err(anyhow::Error::from)?;
            Ok(deleted > 0)
        } else {
            Ok(false)
        }
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

        let categories: Vec<String> = placemark.categories.iter().map(|c| c.to_string()).collect();
        let q = query(
            "CREATE (p:Placemark {id: $id, name: $name, title: $title, \
             description: $description, poi_type: $poi_type, categories: $categories, \
             longitude: $longitude, latitude: $latitude, \
             created_at: $created_at, updated_at: $updated_at})",
        )
        .param("id", placemark.id.to_string())
        .param("name", placemark.name.clone())
        .param("title", placemark.title.clone().unwrap_or_default())
        .param("description", placemark.description.clone().unwrap_or_default())
        .param("poi_type", placemark.poi_type.to_string())
        .param("categories", categories)
        .param("longitude", placemark.location.longitude)
        .param("latitude", placemark.location.latitude)
        .param("created_at", placemark.created_at.to_rfc3339())
        .param("updated_at", placemark.updated_at.to_rfc3339());

        self.graph
            .run(q)
            .await
            .map_err(|e| Self::map_write_err(e, "id"))?;

        Ok(placemark)
    }

    async fn get_placemark(&self, id: Uuid) -> StoreResult<Option<Placemark>> {
        let q = query("MATCH (p:Placemark {id: $id}) RETURN p").param("id", id.to_string());

        let mut result = self.graph.execute(q).await.map_err(anyhow::Error::from)?;
        let Some(row) = result.next().await.map_err(anyhow::Error::from)? else {
            return Ok(None);
        };
        let node: neo4rs::Node = row.get("p").map_err(anyhow::Error::from)?;
        let mut placemark = Self::node_to_placemark(&node)?;

        let mut views = self.fetch_views(&[placemark.id]).await?;
        placemark.views = views.remove(&placemark.id).unwrap_or_default();

        Ok(Some(placemark))
    }

    async fn list_placemarks(&self) -> StoreResult<Vec<Placemark>> {
        let q = query("MATCH (p:Placemark) RETURN p ORDER BY p.created_at DESC");

        let mut result = self.graph.execute(q).await.map_err(anyhow::Error::from)?;
        let mut placemarks = Vec::new();
        while let Some(row) = result.next().await.map_err(anyhow::Error::from)? {
            let node: neo4rs::Node = row.get("p").map_err(anyhow::Error::from)?;
            placemarks.push(Self::node_to_placemark(&node)?);
        }

        let ids: Vec<Uuid> = placemarks.iter().map(|p| p.id).collect();
        let mut views = self.fetch_views(&ids).await?;
        for placemark in &mut placemarks {
            placemark.views = views.remove(&placemark.id).unwrap_or_default();
        }

        Ok(placemarks)
    }

    async fn update_placemark(
        &self,
        id: Uuid,
        update: UpdatePlacemark,
    ) -> StoreResult<Option<Placemark>> {
        let mut assignments = vec!["p.updated_at = $updated_at".to_string()];
        if update.name.is_some() {
            assignments.push("p.name = $name".into());
        }
        if update.title.is_some() {
            assignments.push("p.title = $title".into());
        }
        if update.description.is_some() {
            assignments.push("p.description = $description".into());
        }
        if update.categories.is_some() {
            assignments.push("p.categories = $categories".into());
        }
        if update.location.is_some() {
            assignments.push("p.longitude = $longitude".into());
            assignments.push("p.latitude = $latitude".into());
        }

        let q_str = format!(
            "MATCH (p:Placemark {{id: $id}}) SET {} RETURN p",
            assignments.join(", ")
        );

        let categories: Vec<String> = update
            .categories
            .unwrap_or_default()
            .iter()
            .map(|c| c.to_string())
            .collect();
        let location = update.location.unwrap_or(Location {
            longitude: 0.0,
            latitude: 0.0,
        });

        let q = query(&q_str)
            .param("id", id.to_string())
            .param("updated_at", Utc::now().to_rfc3339())
            .param("name", update.name.unwrap_or_default())
            .param("title", update.title.unwrap_or_default())
            .param("description", update.description.unwrap_or_default())
            .param("categories", categories)
            .param("longitude", location.longitude)
            .param("latitude", location.latitude);

        let mut result = self.graph.execute(q).await.map_err(anyhow::Error::from)?;
        let Some(row) = result.next().await.map_err(anyhow::Error::from)? else {
            return Ok(None);
        };
        let node: neo4rs::Node = row.get("p").map_err(anyhow::Error::from)?;
        let mut placemark = Self::node_to_placemark(&node)?;

        let mut views = self.fetch_views(&[placemark.id]).await?;
        placemark.views = views.remove(&placemark.id).unwrap_or_default();

        Ok(Some(placemark))
    }

    async fn delete_placemark(&self, id: Uuid) -> StoreResult<bool> {
        // Remove the view history with the placemark
        let q_views = query("MATCH (v:PlacemarkView {placemark_id: $id}) DELETE v")
            .param("id", id.to_string());
        self.graph.run(q_views).await.map_err(anyhow::Error::from)?;

        let q = query("MATCH (p:Placemark {id: $id}) DELETE p RETURN count(p) AS deleted")
            .param("id", id.to_string());

        let mut result = self.graph.execute(q).await.map_err(anyhow::Error::from)?;
        if let Some(row) = result.next().await.map_err(anyhow::Error::from)? {
            let deleted: i64 = row.get("deleted").map_err(anyhow::Error::from)?;
            Ok(deleted > 0)
        } else {
            Ok(false)
        }
    }

    async fn record_view(&self, id: Uuid, date: NaiveDate) -> StoreResult<()> {
        let q = query(
            "MERGE (v:PlacemarkView {placemark_id: $id, date: $date}) \
             ON CREATE SET v.count = 1 \
             ON MATCH SET v.count = v.count + 1",
        )
        .param("id", id.to_string())
        .param("date", date.to_string());

        self.graph.run(q).await.map_err(anyhow::Error::from)?;
        Ok(())
    }

    // ========================================================================
    // Categories
    // ========================================================================

    async fn create_category(&self, name: &str) -> StoreResult<Category> {
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };

        let q = query("CREATE (c:Category {id: $id, name: $name})")
            .param("id", category.id.to_string())
            .param("name", category.name.clone());

        self.graph
            .run(q)
            .await
            .map_err(|e| Self::map_write_err(e, "name"))?;

        Ok(category)
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let q = query("MATCH (c:Category) RETURN c.id AS id, c.name AS name ORDER BY c.name");

        let mut result = self.graph.execute(q).await.map_err(anyhow::Error::from)?;
        let mut categories = Vec::new();
        while let Some(row) = result.next().await.map_err(anyhow::Error::from)? {
            categories.push(Category {
                id: row
                    .get::<String>("id")
                    .map_err(anyhow::Error::from)?
                    .parse()
                    .map_err(anyhow::Error::from)?,
                name: row.get("name").map_err(anyhow::Error::from)?,
            });
        }
        Ok(categories)
    }

    async fn delete_category(&self, id: Uuid) -> StoreResult<bool> {
        let q = query("MATCH (c:Category {id: $id}) DELETE c RETURN count(c) AS deleted")
            .param("id", id.to_string());

        let mut result = self.graph.execute(q).await.map_err(anyhow::Error::from)?;
        if let Some(row) = result.next().await.map_err(anyhow::Error::from)? {
            let deleted: i64 = row.get("deleted").map_err(anyhow::Error::from)?;
            Ok(deleted > 0)
        } else {
            Ok(false)
        }
    }

    // ========================================================================
    // POI types
    // ========================================================================

    async fn create_poi_type(&self, name: &str) -> StoreResult<PoiType> {
        let poi_type = PoiType {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };

        let q = query("CREATE (t:PoiType {id: $id, name: $name})")
            .param("id", poi_type.id.to_string())
            .param("name", poi_type.name.clone());

        self.graph
            .run(q)
            .await
            .map_err(|e| Self::map_write_err(e, "name"))?;

        Ok(poi_type)
    }

    async fn get_poi_type(&self, id: Uuid) -> StoreResult<Option<PoiType>> {
        let q = query("MATCH (t:PoiType {id: $id}) RETURN t.id AS id, t.name AS name")
            .param("id", id.to_string());

        let mut result = self.graph.execute(q).await.map_err(anyhow::Error::from)?;
        if let Some(row) = result.next().await.map_err(anyhow::Error::from)? {
            Ok(Some(PoiType {
                id: row
                    .get::<String>("id")
                    .map_err(anyhow::Error::from)?
                    .parse()
                    .map_err(anyhow::Error::from)?,
                name: row.get("name").map_err(anyhow::Error::from)?,
            }))
        } else {
            Ok(None)
        }
    }

    async fn list_poi_types(&self) -> StoreResult<Vec<PoiType>> {
        let q = query("MATCH (t:PoiType) RETURN t.id AS id, t.name AS name ORDER BY t.name");

        let mut result = self.graph.execute(q).await.map_err(anyhow::Error::from)?;
        let mut types = Vec::new();
        while let Some(row) = result.next().await.map_err(anyhow::Error::from)? {
            types.push(PoiType {
                id: row
                    .get::<String>("id")
                    .map_err(anyhow::Error::from)?
                    .parse()
                    .map_err(anyhow::Error::from)?,
                name: row.get("name").map_err(anyhow::Error::from)?,
            });
        }
        Ok(types)
    }

    async fn delete_poi_type(&self, id: Uuid) -> StoreResult<bool> {
        let q = query("MATCH (t:PoiType {id: $id}) DELETE t RETURN count(t) AS deleted")
            .param("id", id.to_string());

        let mut result = self.graph.execute(q).await.map_err(anyhow::Error::from)?;
        if let Some(row) = result.next().await.map_err(anyhow::Error::from)? {
            let deleted: i64 = row.get("deleted").map_err(anyhow::Error::from)?;
            Ok(deleted > 0)
        } else {
            Ok(false)
        }
    }

    // ========================================================================
    // Health
    // ========================================================================

    async fn health_check(&self) -> StoreResult<bool> {
        match self.graph.run(query("RETURN 1")).await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Neo4j health check failed: {}", e);
                Ok(false)
            }
        }
    }
}
