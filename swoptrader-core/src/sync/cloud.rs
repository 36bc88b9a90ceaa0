use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

use super::error::SourceError;
use super::source::CloudSource;
use crate::documents::Document;
use crate::entity::Entity;
use crate::query::EntityQuery;
use crate::store::DocumentStore;

/// Typed view of one collection in a [`DocumentStore`].
pub struct CloudRepository<T> {
    store: Arc<dyn DocumentStore>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> CloudRepository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Entity> CloudSource<T> for CloudRepository<T> {
    async fn get(&self, id: &str) -> Result<Option<T>, SourceError> {
        match self.store.get(T::COLLECTION, id).await? {
            Some(doc) => Ok(Some(T::from_document(id, &doc)?)),
            None => Ok(None),
        }
    }

    async fn query(&self, query: &EntityQuery) -> Result<Vec<T>, SourceError> {
        let docs = self.store.query(T::COLLECTION, query).await?;

        Ok(docs
            .iter()
            .filter_map(|(id, doc)| match T::from_document(id, doc) {
                Ok(entity) => Some(entity),
                Err(e) => {
                    warn!(collection = %T::COLLECTION, "Skipping malformed document: {}", e);
                    None
                }
            })
            .collect())
    }

    async fn set(&self, entity: &T) -> Result<(), SourceError> {
        self.store
            .set(T::COLLECTION, entity.id(), entity.to_document())
            .await?;
        Ok(())
    }

    async fn update_fields(&self, id: &str, fields: Document) -> Result<(), SourceError> {
        self.store.update_fields(T::COLLECTION, id, fields).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), SourceError> {
        self.store.delete(T::COLLECTION, id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::DocumentCodec;
    use crate::models::{Collection, Item};
    use crate::store::MemoryDocumentStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_query_skips_malformed_documents() {
        let store = Arc::new(MemoryDocumentStore::new());
        let good = Item::new("Bike", "u1");
        store
            .set(Collection::Items, &good.id, good.to_document())
            .await
            .unwrap();
        // no ownerId
        let mut bad = Document::new();
        bad.insert("name".into(), json!("Orphan"));
        store.set(Collection::Items, "item_bad", bad).await.unwrap();

        let repo = CloudRepository::<Item>::new(store);
        let items = repo.query(&EntityQuery::all()).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, good.id);
    }

    #[tokio::test]
    async fn test_get_missing_is_none_and_malformed_is_error() {
        let store = Arc::new(MemoryDocumentStore::new());
        store
            .set(Collection::Items, "item_bad", Document::new())
            .await
            .unwrap();
        let repo = CloudRepository::<Item>::new(store);

        assert!(repo.get("nope").await.unwrap().is_none());
        assert!(matches!(
            repo.get("item_bad").await,
            Err(SourceError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_update_fields_reaches_store() {
        let store = Arc::new(MemoryDocumentStore::new());
        let item = Item::new("Bike", "u1");
        let repo = CloudRepository::<Item>::new(store.clone());
        repo.set(&item).await.unwrap();

        let mut fields = Document::new();
        fields.insert("viewCount".into(), json!(3));
        repo.update_fields(&item.id, fields).await.unwrap();

        let stored = repo.get(&item.id).await.unwrap().unwrap();
        assert_eq!(stored.view_count, 3);
        assert_eq!(stored.name, "Bike");
    }
}
