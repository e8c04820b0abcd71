// crates
use bytes::Bytes;
use tessera_core::getter::{GetterError, HeaderGetter};
use tessera_core::header::{ExtendedHeader, HeaderHash};
use tokio::sync::Mutex;
use tracing::{debug, Instrument};
// internal
use crate::backends::{StorageBackend, StorageSerde};
use crate::height_indexer::{HeightIndexer, HeightIndexerSettings};
use crate::StorageError;

const HEADER_PREFIX: &[u8] = b"header/";

pub fn header_key(hash: &HeaderHash) -> Bytes {
    [HEADER_PREFIX, hash.as_slice()].concat().into()
}

/// Headers persisted by hash, reachable by height through a [`HeightIndexer`].
pub struct HeaderStore<Backend> {
    backend: Mutex<Backend>,
    indexer: HeightIndexer,
}

impl<Backend> HeaderStore<Backend>
where
    Backend: StorageBackend + Send + Sync,
{
    pub fn new(backend: Backend, settings: HeightIndexerSettings) -> Self {
        Self {
            backend: Mutex::new(backend),
            indexer: HeightIndexer::new(settings),
        }
    }

    /// Persists `headers`, then indexes their heights.
    pub async fn append(&self, headers: &[ExtendedHeader]) -> Result<(), StorageError> {
        let entries = headers
            .iter()
            .map(|header| {
                Backend::SerdeOperator::serialize(header)
                    .map(|value| (header_key(&header.hash()), value))
                    .map_err(StorageError::serde)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut backend = self.backend.lock().await;
        backend
            .store_batch(entries)
            .await
            .map_err(StorageError::backend)?;
        self.indexer.index(&mut *backend, headers).await?;
        debug!(headers = headers.len(), "Stored headers");
        Ok(())
    }

    pub async fn get(&self, hash: &HeaderHash) -> Result<Option<ExtendedHeader>, StorageError> {
        let mut backend = self.backend.lock().await;
        Self::load(&mut backend, hash).await
    }

    pub async fn get_by_height(&self, height: u64) -> Result<Option<ExtendedHeader>, StorageError> {
        let mut backend = self.backend.lock().await;
        let Some(hash) = self.indexer.hash_by_height(&mut *backend, height).await? else {
            return Ok(None);
        };
        Self::load(&mut backend, &hash).await
    }

    pub async fn has(&self, hash: &HeaderHash) -> Result<bool, StorageError> {
        let mut backend = self.backend.lock().await;
        Ok(backend
            .load(&header_key(hash))
            .await
            .map_err(StorageError::backend)?
            .is_some())
    }

    async fn load(
        backend: &mut Backend,
        hash: &HeaderHash,
    ) -> Result<Option<ExtendedHeader>, StorageError> {
        backend
            .load(&header_key(hash))
            .await
            .map_err(StorageError::backend)?
            .map(|bytes| Backend::SerdeOperator::deserialize(&bytes).map_err(StorageError::serde))
            .transpose()
    }
}

#[async_trait::async_trait]
impl<Backend> HeaderGetter for HeaderStore<Backend>
where
    Backend: StorageBackend + Send + Sync,
{
    async fn get_by_height(&self, height: u64) -> Result<ExtendedHeader, GetterError> {
        HeaderStore::get_by_height(self, height)
            .instrument(tracing::debug_span!("header_store", height))
            .await
            .map_err(|e| GetterError::Other(Box::new(e)))?
            .ok_or(GetterError::NotFound)
    }
}
