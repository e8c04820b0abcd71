// crates
use bytes::Bytes;
use moka::future::{Cache, CacheBuilder};
use serde::{Deserialize, Serialize};
use tessera_core::header::{ExtendedHeader, HeaderHash};
use tracing::debug;
// internal
use crate::backends::StorageBackend;
use crate::StorageError;

const HEIGHT_PREFIX: &[u8] = b"height/";

/// Key under which the hash of the header at `height` is stored, ordered by height.
pub fn height_key(height: u64) -> Bytes {
    [HEIGHT_PREFIX, &height.to_be_bytes()].concat().into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightIndexerSettings {
    pub cache_size: u64,
}

impl Default for HeightIndexerSettings {
    fn default() -> Self {
        Self { cache_size: 2048 }
    }
}

/// Maps header heights to header hashes.
///
/// Entries reach the backend before they reach the cache, so the cache never holds a mapping the
/// backend does not.
pub struct HeightIndexer {
    cache: Cache<u64, HeaderHash>,
}

impl HeightIndexer {
    pub fn new(settings: HeightIndexerSettings) -> Self {
        let cache = CacheBuilder::new(settings.cache_size)
            .name("height-index")
            .build();
        Self { cache }
    }

    pub async fn hash_by_height<Backend: StorageBackend>(
        &self,
        backend: &mut Backend,
        height: u64,
    ) -> Result<Option<HeaderHash>, StorageError> {
        if let Some(hash) = self.cache.get(&height).await {
            return Ok(Some(hash));
        }
        let Some(bytes) = backend
            .load(&height_key(height))
            .await
            .map_err(StorageError::backend)?
        else {
            return Ok(None);
        };
        let hash: HeaderHash = bytes
            .as_ref()
            .try_into()
            .map_err(|_| StorageError::Corrupted {
                key: format!("height/{height}"),
            })?;
        self.cache.insert(height, hash).await;
        Ok(Some(hash))
    }

    pub async fn index<Backend: StorageBackend>(
        &self,
        backend: &mut Backend,
        headers: &[ExtendedHeader],
    ) -> Result<(), StorageError> {
        let entries: Vec<(u64, HeaderHash)> = headers
            .iter()
            .map(|header| (header.height, header.hash()))
            .collect();
        backend
            .store_batch(
                entries
                    .iter()
                    .map(|(height, hash)| (height_key(*height), Bytes::copy_from_slice(hash)))
                    .collect(),
            )
            .await
            .map_err(StorageError::backend)?;
        for (height, hash) in entries {
            self.cache.insert(height, hash).await;
        }
        debug!(headers = headers.len(), "Indexed header heights");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) async fn cached(&self, height: u64) -> Option<HeaderHash> {
        self.cache.get(&height).await
    }
}
