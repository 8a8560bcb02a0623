//! Document models stored in Neo4j

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// How an identity proves itself: a local password hash or Google federation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Password,
    Google,
}

impl fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthProvider::Password => write!(f, "password"),
            AuthProvider::Google => write!(f, "google"),
        }
    }
}

impl FromStr for AuthProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "password" => Ok(AuthProvider::Password),
            "google" => Ok(AuthProvider::Google),
            other => Err(format!("unknown auth provider: {}", other)),
        }
    }
}

/// A stored user identity.
///
/// `password_hash` is None only for federated identities. This struct never
/// crosses the API boundary — handlers convert to a sanitized response type.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    /// Unique login, email-formatted, stored lowercase
    pub login: String,
    pub name: Option<String>,
    pub second_name: Option<String>,
    pub password_hash: Option<String>,
    pub provider: AuthProvider,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: String,
    pub name: Option<String>,
    pub second_name: Option<String>,
    /// None for federated identities
    pub password_hash: Option<String>,
    pub provider: AuthProvider,
}

/// Partial update of a user's display fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub second_name: Option<String>,
}

/// A geographic point, GeoJSON-style (longitude first)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub longitude: f64,
    pub latitude: f64,
}

impl Location {
    /// Validate coordinate ranges: longitude ∈ [-180, 180], latitude ∈ [-90, 90]
    pub fn is_valid(&self) -> bool {
        (-180.0..=180.0).contains(&self.longitude) && (-90.0..=90.0).contains(&self.latitude)
    }
}

/// View count for one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyViews {
    pub date: NaiveDate,
    pub count: i64,
}

/// A point of interest on the map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Placemark {
    pub id: Uuid,
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Reference to a PoiType
    pub poi_type: Uuid,
    /// References to Categories
    pub categories: Vec<Uuid>,
    pub location: Location,
    /// Per-day view buckets, oldest first
    pub views: Vec<DailyViews>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a placemark
#[derive(Debug, Clone, Deserialize)]
pub struct NewPlacemark {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub poi_type: Uuid,
    #[serde(default)]
    pub categories: Vec<Uuid>,
    pub location: Location,
}

/// Partial update of a placemark
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePlacemark {
    pub name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub categories: Option<Vec<Uuid>>,
    pub location: Option<Location>,
}

/// A placemark category (unique name)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

/// A placemark type (unique name)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoiType {
    pub id: Uuid,
    pub name: String,
}

// ============================================================================
// Tests
// ============================================================================
