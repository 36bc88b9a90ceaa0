//! Cloud document store: the fallback remote behind the REST backend.
//!
//! [`DocumentStore`] is the raw, loosely-typed surface (collections of
//! string-keyed maps). [`FirestoreClient`] talks to Firestore's REST API;
//! [`MemoryDocumentStore`] keeps everything in process for demos and tests.

mod firestore;
mod memory;
mod value;

pub use firestore::{FirestoreClient, FirestoreSettings};
pub use memory::MemoryDocumentStore;
pub use value::{decode_fields, decode_value, encode_fields, encode_value};

use async_trait::async_trait;

use crate::documents::Document;
use crate::models::Collection;
use crate::query::EntityQuery;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Store returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Document {collection}/{id} not found")]
    NotFound { collection: Collection, id: String },
    #[error("Malformed store response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError>;

    /// Creates or fully replaces a document.
    async fn set(&self, collection: Collection, id: &str, doc: Document) -> Result<(), StoreError>;

    /// Overwrites the given top-level fields of an existing document.
    /// Fails with [`StoreError::NotFound`] if the document does not exist.
    async fn update_fields(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError>;

    async fn query(
        &self,
        collection: Collection,
        query: &EntityQuery,
    ) -> Result<Vec<(String, Document)>, StoreError>;
}
