use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::{DocumentStore, StoreError};
use crate::documents::Document;
use crate::models::Collection;
use crate::query::EntityQuery;

/// In-process document store.
///
/// Can be switched offline to simulate an unreachable cloud backend; while
/// offline every operation fails with [`StoreError::Unavailable`].
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<Collection, BTreeMap<String, Document>>>,
    offline: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    /// Number of documents in a collection, regardless of the offline switch.
    pub async fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.is_offline() {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        self.check_online()?;
        Ok(self
            .collections
            .read()
            .await
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn set(&self, collection: Collection, id: &str, doc: Document) -> Result<(), StoreError> {
        self.check_online()?;
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .insert(id.to_string(), doc);
        Ok(())
    }

    async fn update_fields(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        self.check_online()?;
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(&collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.to_string(),
            })?;

        for (key, value) in fields {
            doc.insert(key, value);
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        self.check_online()?;
        if let Some(docs) = self.collections.write().await.get_mut(&collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        query: &EntityQuery,
    ) -> Result<Vec<(String, Document)>, StoreError> {
        self.check_online()?;
        let docs: Vec<(String, Document)> = self
            .collections
            .read()
            .await
            .get(&collection)
            .map(|docs| docs.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();

        Ok(query.apply(docs))
    }
}
