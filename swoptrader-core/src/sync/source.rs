//! Capability traits for the three places an entity can live.

use async_trait::async_trait;
use tokio::sync::watch;

use super::error::{CacheError, SourceError};
use crate::documents::Document;
use crate::entity::Entity;
use crate::query::EntityQuery;

/// Read-only REST backend. `Ok(None)` means the backend answered that the
/// entity does not exist.
#[async_trait]
pub trait RemoteSource<T: Entity>: Send + Sync {
    async fn fetch(&self, id: &str) -> Result<Option<T>, SourceError>;

    async fn fetch_all(&self, query: &EntityQuery) -> Result<Vec<T>, SourceError>;
}

/// Cloud document store holding the shared copy of every entity.
#[async_trait]
pub trait CloudSource<T: Entity>: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<T>, SourceError>;

    async fn query(&self, query: &EntityQuery) -> Result<Vec<T>, SourceError>;

    async fn set(&self, entity: &T) -> Result<(), SourceError>;

    async fn update_fields(&self, id: &str, fields: Document) -> Result<(), SourceError>;

    async fn delete(&self, id: &str) -> Result<(), SourceError>;
}

/// Device-local mirror. Upserts are insert-or-replace keyed by id.
#[async_trait]
pub trait LocalCache<T: Entity>: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<T>, CacheError>;

    async fn query(&self, query: &EntityQuery) -> Result<Vec<T>, CacheError>;

    async fn upsert(&self, entity: &T) -> Result<(), CacheError>;

    async fn upsert_all(&self, entities: &[T]) -> Result<(), CacheError>;

    async fn delete(&self, id: &str) -> Result<(), CacheError>;

    /// Receiver whose value is bumped after every write to this cache.
    fn subscribe(&self) -> watch::Receiver<u64>;
}
