//! Offline-first synchronization between the REST backend, the cloud
//! document store and the local cache.

mod cloud;
mod error;
mod memory_cache;
mod policy;
mod source;

pub use cloud::CloudRepository;
pub use error::{CacheError, SourceError, SyncError};
pub use memory_cache::{CacheProvider, MemoryCache, MemoryCacheProvider};
pub use policy::{Origin, Resolved, SyncPolicy, WriteAckPolicy};
pub use source::{CloudSource, LocalCache, RemoteSource};
