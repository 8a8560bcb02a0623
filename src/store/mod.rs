//! Persistence layer — Neo4j client, document models and the store trait

pub mod client;
pub mod models;
pub mod traits;

pub use client::Neo4jClient;
pub use models::*;
pub use traits::{PoiStore, StoreError, StoreResult};

#[cfg(test)]
pub(crate) mod mock;
