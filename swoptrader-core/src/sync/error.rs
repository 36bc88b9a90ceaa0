use crate::documents::DecodeError;
use crate::models::Collection;
use crate::store::StoreError;

/// Failure of a remote source (REST backend or cloud store).
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server returned status {0}")]
    Status(u16),
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Failure of the local cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),
    #[error("Corrupt cache entry '{id}': {message}")]
    Corrupt { id: String, message: String },
}

/// Failure surfaced to callers of the sync layer.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Every source failed, including the local cache.
    #[error("Data unavailable: {0}")]
    Unavailable(String),
    #[error("Local write failed: {0}")]
    Local(#[from] CacheError),
    /// Cloud write failed under a policy that requires remote confirmation.
    #[error("Cloud write failed: {0}")]
    RemoteWrite(#[source] SourceError),
    #[error("{collection} '{id}' not found")]
    NotFound { collection: Collection, id: String },
}

impl SyncError {
    pub fn not_found(collection: Collection, id: impl Into<String>) -> Self {
        SyncError::NotFound {
            collection,
            id: id.into(),
        }
    }
}
