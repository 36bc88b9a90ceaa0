use futures::future::BoxFuture;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

use super::error::{CacheError, SourceError, SyncError};
use super::source::{CloudSource, LocalCache, RemoteSource};
use crate::documents::Document;
use crate::entity::{to_json_document, Entity};
use crate::query::EntityQuery;

/// How a write is acknowledged once the local cache has accepted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteAckPolicy {
    /// Cloud failures are logged and the write still succeeds.
    #[default]
    LocalFirst,
    /// Cloud failures fail the write (the local copy is kept).
    RemoteConfirmed,
}

impl WriteAckPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteAckPolicy::LocalFirst => "local_first",
            WriteAckPolicy::RemoteConfirmed => "remote_confirmed",
        }
    }
}

impl fmt::Display for WriteAckPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WriteAckPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "local_first" | "local" => Ok(WriteAckPolicy::LocalFirst),
            "remote_confirmed" | "remote" => Ok(WriteAckPolicy::RemoteConfirmed),
            _ => Err(format!(
                "Unknown write policy '{}', expected local_first or remote_confirmed",
                s
            )),
        }
    }
}

/// The source that answered a read or acknowledged a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Remote,
    Cloud,
    Local,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Origin::Remote => "remote",
            Origin::Cloud => "cloud",
            Origin::Local => "local",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<V> {
    pub value: V,
    pub origin: Origin,
}

impl<V> Resolved<V> {
    pub fn into_inner(self) -> V {
        self.value
    }
}

/// Offline-first access to one entity type.
///
/// Reads try the REST backend, then the cloud store, then the local cache;
/// whatever a remote returns is mirrored into the cache. Writes go to the
/// cache first and then to the cloud store.
pub struct SyncPolicy<T: Entity> {
    remote: Option<Arc<dyn RemoteSource<T>>>,
    cloud: Option<Arc<dyn CloudSource<T>>>,
    local: Arc<dyn LocalCache<T>>,
    write_ack: WriteAckPolicy,
}

impl<T: Entity> Clone for SyncPolicy<T> {
    fn clone(&self) -> Self {
        Self {
            remote: self.remote.clone(),
            cloud: self.cloud.clone(),
            local: Arc::clone(&self.local),
            write_ack: self.write_ack,
        }
    }
}

impl<T: Entity> SyncPolicy<T> {
    pub fn new(local: Arc<dyn LocalCache<T>>) -> Self {
        Self {
            remote: None,
            cloud: None,
            local,
            write_ack: WriteAckPolicy::default(),
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteSource<T>>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_cloud(mut self, cloud: Arc<dyn CloudSource<T>>) -> Self {
        self.cloud = Some(cloud);
        self
    }

    pub fn with_write_ack(mut self, write_ack: WriteAckPolicy) -> Self {
        self.write_ack = write_ack;
        self
    }

    pub fn write_ack(&self) -> WriteAckPolicy {
        self.write_ack
    }

    pub fn local(&self) -> &Arc<dyn LocalCache<T>> {
        &self.local
    }

    pub async fn get(&self, id: &str) -> Result<Option<T>, SyncError> {
        Ok(self.get_resolved(id).await?.value)
    }

    pub async fn get_resolved(&self, id: &str) -> Result<Resolved<Option<T>>, SyncError> {
        let what = format!("{}/{}", T::COLLECTION, id);
        self.resolve(
            &what,
            self.remote.as_ref().map(|remote| remote.fetch(id)),
            self.cloud.as_ref().map(|cloud| cloud.get(id)),
            self.local.get(id),
            Option::as_slice,
        )
        .await
    }

    pub async fn list(&self, query: &EntityQuery) -> Result<Vec<T>, SyncError> {
        Ok(self.list_resolved(query).await?.value)
    }

    pub async fn list_resolved(&self, query: &EntityQuery) -> Result<Resolved<Vec<T>>, SyncError> {
        let what = T::COLLECTION.to_string();
        self.resolve(
            &what,
            self.remote.as_ref().map(|remote| remote.fetch_all(query)),
            self.cloud.as_ref().map(|cloud| cloud.query(query)),
            self.local.query(query),
            Vec::as_slice,
        )
        .await
    }

    /// Like [`SyncPolicy::get`] but a missing entity is an error.
    pub async fn require(&self, id: &str) -> Result<T, SyncError> {
        self.get(id)
            .await?
            .ok_or_else(|| SyncError::not_found(T::COLLECTION, id))
    }

    /// Reads only the local cache.
    pub async fn cached(&self, id: &str) -> Result<Option<T>, SyncError> {
        Ok(self.local.get(id).await?)
    }

    pub async fn save(&self, entity: T) -> Result<Resolved<T>, SyncError> {
        self.local.upsert(&entity).await?;

        let origin = match &self.cloud {
            Some(cloud) => {
                let result = cloud.set(&entity).await;
                self.acknowledge(&format!("save {}/{}", T::COLLECTION, entity.id()), result)?
            }
            None => Origin::Local,
        };

        Ok(Resolved {
            value: entity,
            origin,
        })
    }

    pub async fn delete(&self, id: &str) -> Result<Origin, SyncError> {
        self.local.delete(id).await?;

        match &self.cloud {
            Some(cloud) => {
                let result = cloud.delete(id).await;
                self.acknowledge(&format!("delete {}/{}", T::COLLECTION, id), result)
            }
            None => Ok(Origin::Local),
        }
    }

    /// Merges `fields` (camelCase keys) into the cached copy, if any, and
    /// sends them to the cloud store as a field-level update.
    pub async fn patch(&self, id: &str, fields: Document) -> Result<Resolved<Option<T>>, SyncError> {
        let merged = match self.local.get(id).await? {
            Some(cached) => {
                let mut body = to_json_document(&cached);
                for (key, value) in &fields {
                    body.insert(key.clone(), value.clone());
                }
                let merged: T = serde_json::from_value(Value::Object(body)).map_err(|e| {
                    CacheError::Corrupt {
                        id: id.to_string(),
                        message: e.to_string(),
                    }
                })?;
                self.local.upsert(&merged).await?;
                Some(merged)
            }
            None => None,
        };

        let origin = match &self.cloud {
            Some(cloud) => {
                let result = cloud.update_fields(id, fields).await;
                self.acknowledge(&format!("patch {}/{}", T::COLLECTION, id), result)?
            }
            None => Origin::Local,
        };

        Ok(Resolved {
            value: merged,
            origin,
        })
    }

    /// Emits the cached result of `query` now and again after every write
    /// to the local cache. Never contacts a remote.
    pub fn observe(&self, query: EntityQuery) -> BoxStream<'static, Result<Vec<T>, SyncError>> {
        let local = Arc::clone(&self.local);
        let changes = local.subscribe();

        stream::unfold(
            (local, changes, query, true),
            |(local, mut changes, query, first)| async move {
                if first {
                    changes.borrow_and_update();
                } else if changes.changed().await.is_err() {
                    return None;
                }
                let snapshot = local.query(&query).await.map_err(SyncError::from);
                Some((snapshot, (local, changes, query, false)))
            },
        )
        .boxed()
    }

    async fn resolve<'a, V>(
        &'a self,
        what: &str,
        remote: Option<BoxFuture<'a, Result<V, SourceError>>>,
        cloud: Option<BoxFuture<'a, Result<V, SourceError>>>,
        local: BoxFuture<'a, Result<V, CacheError>>,
        mirror: fn(&V) -> &[T],
    ) -> Result<Resolved<V>, SyncError> {
        let mut failures = Vec::new();

        if let Some(remote) = remote {
            match remote.await {
                Ok(value) => {
                    self.mirror(what, mirror(&value)).await;
                    debug!(origin = %Origin::Remote, "Resolved {}", what);
                    return Ok(Resolved {
                        value,
                        origin: Origin::Remote,
                    });
                }
                Err(e) => {
                    warn!("REST read of {} failed, falling back: {}", what, e);
                    failures.push(format!("remote: {}", e));
                }
            }
        }

        if let Some(cloud) = cloud {
            match cloud.await {
                Ok(value) => {
                    self.mirror(what, mirror(&value)).await;
                    debug!(origin = %Origin::Cloud, "Resolved {}", what);
                    return Ok(Resolved {
                        value,
                        origin: Origin::Cloud,
                    });
                }
                Err(e) => {
                    warn!("Cloud read of {} failed, falling back: {}", what, e);
                    failures.push(format!("cloud: {}", e));
                }
            }
        }

        match local.await {
            Ok(value) => {
                debug!(origin = %Origin::Local, "Resolved {}", what);
                Ok(Resolved {
                    value,
                    origin: Origin::Local,
                })
            }
            Err(e) => {
                failures.push(format!("local: {}", e));
                Err(SyncError::Unavailable(failures.join("; ")))
            }
        }
    }

    async fn mirror(&self, what: &str, entities: &[T]) {
        if entities.is_empty() {
            return;
        }
        if let Err(e) = self.local.upsert_all(entities).await {
            warn!("Failed to mirror {} into the local cache: {}", what, e);
        }
    }

    fn acknowledge(&self, what: &str, result: Result<(), SourceError>) -> Result<Origin, SyncError> {
        match result {
            Ok(()) => {
                debug!(origin = %Origin::Cloud, "Acknowledged {}", what);
                Ok(Origin::Cloud)
            }
            Err(e) => match self.write_ack {
                WriteAckPolicy::LocalFirst => {
                    warn!("Cloud write failed, kept locally ({}): {}", what, e);
                    Ok(Origin::Local)
                }
                WriteAckPolicy::RemoteConfirmed => Err(SyncError::RemoteWrite(e)),
            },
        }
    }
}
