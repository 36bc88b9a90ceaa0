use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::documents::DocumentCodec;
use crate::models::{
    Chat, ChatMessage, Collection, Comment, Item, Meetup, Offer, TradeHistory, User,
};

/// A record persisted across the REST backend, the cloud store and the local cache.
///
/// Serde (camelCase JSON) is the REST and cache representation; the
/// [`DocumentCodec`] is the cloud-store representation.
pub trait Entity:
    Clone + Send + Sync + Serialize + DeserializeOwned + DocumentCodec + 'static
{
    const COLLECTION: Collection;

    fn id(&self) -> &str;
}

impl Entity for Item {
    const COLLECTION: Collection = Collection::Items;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for User {
    const COLLECTION: Collection = Collection::Users;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Offer {
    const COLLECTION: Collection = Collection::Offers;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Meetup {
    const COLLECTION: Collection = Collection::Meetups;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Chat {
    const COLLECTION: Collection = Collection::Chats;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for ChatMessage {
    const COLLECTION: Collection = Collection::ChatMessages;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Comment {
    const COLLECTION: Collection = Collection::Comments;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for TradeHistory {
    const COLLECTION: Collection = Collection::TradeHistory;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Serializes an entity into its cache/REST JSON body.
pub fn to_json_document<T: Entity>(entity: &T) -> serde_json::Map<String, serde_json::Value> {
    match serde_json::to_value(entity) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    }
}
