use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

use super::error::CacheError;
use super::source::LocalCache;
use crate::documents::Document;
use crate::entity::{to_json_document, Entity};
use crate::query::EntityQuery;

/// Hands out one local cache per entity type.
pub trait CacheProvider: Send + Sync {
    fn cache<T: Entity>(&self) -> Arc<dyn LocalCache<T>>;
}

/// Local cache kept in process memory, stored as the entity's JSON body.
pub struct MemoryCache<T> {
    rows: RwLock<BTreeMap<String, Document>>,
    changes: watch::Sender<u64>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> MemoryCache<T> {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            rows: RwLock::new(BTreeMap::new()),
            changes,
            _entity: PhantomData,
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version += 1);
    }

    fn decode(id: &str, row: &Document) -> Result<T, CacheError> {
        serde_json::from_value(Value::Object(row.clone())).map_err(|e| CacheError::Corrupt {
            id: id.to_string(),
            message: e.to_string(),
        })
    }
}

impl<T: Entity> Default for MemoryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Entity> LocalCache<T> for MemoryCache<T> {
    async fn get(&self, id: &str) -> Result<Option<T>, CacheError> {
        self.rows
            .read()
            .await
            .get(id)
            .map(|row| Self::decode(id, row))
            .transpose()
    }

    async fn query(&self, query: &EntityQuery) -> Result<Vec<T>, CacheError> {
        let rows: Vec<(String, Document)> = self
            .rows
            .read()
            .await
            .iter()
            .map(|(id, row)| (id.clone(), row.clone()))
            .collect();

        query
            .apply(rows)
            .iter()
            .map(|(id, row)| Self::decode(id, row))
            .collect()
    }

    async fn upsert(&self, entity: &T) -> Result<(), CacheError> {
        self.rows
            .write()
            .await
            .insert(entity.id().to_string(), to_json_document(entity));
        self.notify();
        Ok(())
    }

    async fn upsert_all(&self, entities: &[T]) -> Result<(), CacheError> {
        {
            let mut rows = self.rows.write().await;
            for entity in entities {
                rows.insert(entity.id().to_string(), to_json_document(entity));
            }
        }
        self.notify();
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), CacheError> {
        self.rows.write().await.remove(id);
        self.notify();
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}

/// Gives every entity type a fresh [`MemoryCache`].
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryCacheProvider;

impl CacheProvider for MemoryCacheProvider {
    fn cache<T: Entity>(&self) -> Arc<dyn LocalCache<T>> {
        Arc::new(MemoryCache::<T>::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Item, ItemCategory};
    use crate::query::Direction;

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let cache = MemoryCache::<Item>::new();
        let mut item = Item::new("Lamp", "u1");
        cache.upsert(&item).await.unwrap();

        item.name = "Desk lamp".to_string();
        cache.upsert(&item).await.unwrap();

        assert_eq!(cache.len().await, 1);
        let cached = cache.get(&item.id).await.unwrap().unwrap();
        assert_eq!(cached.name, "Desk lamp");
    }

    #[tokio::test]
    async fn test_query_uses_camel_case_fields() {
        let cache = MemoryCache::<Item>::new();
        let mut a = Item::new("A", "u1").with_category(ItemCategory::Books);
        a.created_at = 1;
        let mut b = Item::new("B", "u2");
        b.created_at = 2;
        let mut c = Item::new("C", "u1");
        c.created_at = 3;
        cache.upsert_all(&[a, b, c]).await.unwrap();

        let owned = cache
            .query(
                &EntityQuery::all()
                    .where_eq("ownerId", "u1")
                    .order_by("createdAt", Direction::Ascending),
            )
            .await
            .unwrap();
        let names: Vec<&str> = owned.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);

        let books = cache
            .query(&EntityQuery::all().where_eq("category", "BOOKS"))
            .await
            .unwrap();
        assert_eq!(books.len(), 1);
    }

    #[tokio::test]
    async fn test_writes_bump_subscription() {
        let cache = MemoryCache::<Item>::new();
        let mut changes = cache.subscribe();
        let item = Item::new("Lamp", "u1");

        cache.upsert(&item).await.unwrap();
        assert!(changes.has_changed().unwrap());
        changes.borrow_and_update();

        cache.get(&item.id).await.unwrap();
        assert!(!changes.has_changed().unwrap());

        cache.delete(&item.id).await.unwrap();
        assert!(changes.has_changed().unwrap());
        assert!(cache.get(&item.id).await.unwrap().is_none());
    }
}
