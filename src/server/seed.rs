use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use swoptrader_core::{
    Chat, ChatMessage, Collection, Comment, DocumentStore, Entity, Item, Meetup, Offer, StoreError,
    TradeHistory, User,
};

#[derive(Debug)]
pub enum SeedError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_json::Error),
    UnknownCollection(String),
    InvalidEntity(Collection, serde_json::Error),
    Store(StoreError),
}

impl std::fmt::Display for SeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeedError::ReadError(path, e) => {
                write!(f, "Failed to read seed file '{}': {}", path.display(), e)
            }
            SeedError::ParseError(path, e) => {
                write!(f, "Failed to parse seed file '{}': {}", path.display(), e)
            }
            SeedError::UnknownCollection(name) => write!(f, "Unknown collection '{}'", name),
            SeedError::InvalidEntity(collection, e) => {
                write!(f, "Invalid {} entry: {}", collection, e)
            }
            SeedError::Store(e) => write!(f, "Failed to write seed data: {}", e),
        }
    }
}

impl std::error::Error for SeedError {}

async fn seed_collection<T: Entity>(
    store: &dyn DocumentStore,
    entries: Vec<Value>,
) -> Result<usize, SeedError> {
    let count = entries.len();
    for entry in entries {
        let entity: T = serde_json::from_value(entry)
            .map_err(|e| SeedError::InvalidEntity(T::COLLECTION, e))?;
        store
            .set(T::COLLECTION, entity.id(), entity.to_document())
            .await
            .map_err(SeedError::Store)?;
    }
    Ok(count)
}

/// Loads `{"<collection>": [<entity json>, ...]}` into the store.
pub async fn seed_store(store: &dyn DocumentStore, path: &Path) -> Result<usize, SeedError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| SeedError::ReadError(path.to_path_buf(), e))?;
    let data: BTreeMap<String, Vec<Value>> = serde_json::from_str(&contents)
        .map_err(|e| SeedError::ParseError(path.to_path_buf(), e))?;

    let mut total = 0;
    for (name, entries) in data {
        let collection: Collection = name
            .parse()
            .map_err(|_| SeedError::UnknownCollection(name.clone()))?;
        total += match collection {
            Collection::Items => seed_collection::<Item>(store, entries).await?,
            Collection::Users => seed_collection::<User>(store, entries).await?,
            Collection::Comments => seed_collection::<Comment>(store, entries).await?,
            Collection::Chats => seed_collection::<Chat>(store, entries).await?,
            Collection::ChatMessages => seed_collection::<ChatMessage>(store, entries).await?,
            Collection::Offers => seed_collection::<Offer>(store, entries).await?,
            Collection::Meetups => seed_collection::<Meetup>(store, entries).await?,
            Collection::TradeHistory => seed_collection::<TradeHistory>(store, entries).await?,
        };
    }

    Ok(total)
}
