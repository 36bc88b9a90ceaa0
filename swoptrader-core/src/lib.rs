//! SwopTrader Core Library
//!
//! Shared models, the offline-first sync layer and trade scoring for
//! SwopTrader applications.

pub mod api;
pub mod documents;
pub mod entity;
pub mod models;
pub mod query;
pub mod repository;
pub mod scoring;
pub mod store;
pub mod sync;
pub mod trade;

pub use api::{ApiClient, Envelope, Page};
pub use documents::{DecodeError, Document, DocumentCodec};
pub use entity::Entity;
pub use models::{
    Chat, ChatMessage, Collection, Comment, Item, ItemCategory, ItemCondition, Location, Meetup,
    MeetupLocation, MeetupLocationType, MeetupStatus, MeetupType, MessageType, Offer, OfferStatus,
    TradeHistory, TradeRating, TradedItem, User,
};
pub use query::{Direction, EntityQuery, Filter};
pub use repository::{DataSources, OfferError, Repositories};
pub use store::{DocumentStore, FirestoreClient, FirestoreSettings, MemoryDocumentStore, StoreError};
pub use sync::{
    CacheError, CacheProvider, LocalCache, MemoryCacheProvider, Origin, SourceError, SyncError,
    SyncPolicy, WriteAckPolicy,
};
pub use trade::{TradeCompletionReport, TradeError, TradeService};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
