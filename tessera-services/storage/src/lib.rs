pub mod backends;
pub mod headers;
pub mod height_indexer;

// crates
use tessera_core::DynError;
// internal
pub use backends::{StorageBackend, StorageSerde, WireSerde};
pub use headers::HeaderStore;
pub use height_indexer::{HeightIndexer, HeightIndexerSettings};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage backend failure: {0}")]
    Backend(#[source] DynError),
    #[error("could not encode or decode stored value: {0}")]
    Serde(#[source] DynError),
    #[error("corrupted value under {key}")]
    Corrupted { key: String },
}

impl StorageError {
    pub fn backend<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
        Self::Backend(Box::new(e))
    }

    pub fn serde<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
        Self::Serde(Box::new(e))
    }
}
