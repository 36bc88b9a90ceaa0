//! Per-entity repositories built on [`SyncPolicy`].

mod chat;
mod comment;
mod history;
mod item;
mod meetup;
mod offer;
mod user;

pub use chat::ChatRepository;
pub use comment::CommentRepository;
pub use history::TradeHistoryRepository;
pub use item::ItemRepository;
pub use meetup::MeetupRepository;
pub use offer::{OfferError, OfferRepository};
pub use user::UserRepository;

use serde_json::Value;
use std::sync::Arc;

use crate::api::ApiClient;
use crate::documents::Document;
use crate::entity::Entity;
use crate::models::now_millis;
use crate::store::DocumentStore;
use crate::sync::{CacheProvider, CloudRepository, LocalCache, SyncPolicy, WriteAckPolicy};

/// Which remotes are configured, and how writes are acknowledged.
#[derive(Clone, Default)]
pub struct DataSources {
    pub api: Option<Arc<ApiClient>>,
    pub store: Option<Arc<dyn DocumentStore>>,
    pub write_ack: WriteAckPolicy,
}

impl DataSources {
    /// No remotes: every read and write is served by the local cache.
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn with_api(mut self, api: ApiClient) -> Self {
        self.api = Some(Arc::new(api));
        self
    }

    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_write_ack(mut self, write_ack: WriteAckPolicy) -> Self {
        self.write_ack = write_ack;
        self
    }

    pub fn policy<T: Entity>(&self, cache: Arc<dyn LocalCache<T>>) -> SyncPolicy<T> {
        let mut policy = SyncPolicy::new(cache).with_write_ack(self.write_ack);
        if let Some(api) = &self.api {
            policy = policy.with_remote(api.clone());
        }
        if let Some(store) = &self.store {
            policy = policy.with_cloud(Arc::new(CloudRepository::<T>::new(store.clone())));
        }
        policy
    }
}

/// Every repository, sharing one cache per entity type.
#[derive(Clone)]
pub struct Repositories {
    pub items: ItemRepository,
    pub users: UserRepository,
    pub offers: OfferRepository,
    pub meetups: MeetupRepository,
    pub chats: ChatRepository,
    pub comments: CommentRepository,
    pub history: TradeHistoryRepository,
}

impl Repositories {
    pub fn new<P: CacheProvider>(sources: &DataSources, caches: &P) -> Self {
        let items = sources.policy(caches.cache());

        Self {
            items: ItemRepository::new(items.clone()),
            users: UserRepository::new(sources.policy(caches.cache())),
            offers: OfferRepository::new(sources.policy(caches.cache()), items.clone()),
            meetups: MeetupRepository::new(sources.policy(caches.cache())),
            chats: ChatRepository::new(
                sources.policy(caches.cache()),
                sources.policy(caches.cache()),
            ),
            comments: CommentRepository::new(sources.policy(caches.cache()), items),
            history: TradeHistoryRepository::new(sources.policy(caches.cache())),
        }
    }
}

/// Field update body for [`SyncPolicy::patch`], stamped with `updatedAt`.
pub(crate) fn touched(fields: impl IntoIterator<Item = (&'static str, Value)>) -> Document {
    let mut doc: Document = fields
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    doc.insert("updatedAt".to_string(), Value::from(now_millis()));
    doc
}
