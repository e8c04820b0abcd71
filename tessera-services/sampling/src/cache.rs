// crates
use bytes::Bytes;
use tessera_core::Root;
use tessera_storage::backends::{StorageBackend, StorageSerde};
use tessera_storage::StorageError;
use tokio::sync::Mutex;
use tracing::debug;
// internal
use crate::{Availability, AvailabilityError};

const SAMPLING_RESULT_PREFIX: &[u8] = b"sampling_result/";

pub fn sampling_result_key(root: &Root) -> Bytes {
    [SAMPLING_RESULT_PREFIX, root.hash().as_slice()].concat().into()
}

/// Remembers roots found available so later checks skip the work.
pub struct CachedAvailability<A, Backend> {
    inner: A,
    backend: Mutex<Backend>,
}

impl<A, Backend> CachedAvailability<A, Backend>
where
    A: Availability,
    Backend: StorageBackend + Send + Sync,
{
    pub fn new(inner: A, backend: Backend) -> Self {
        Self {
            inner,
            backend: Mutex::new(backend),
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    async fn is_cached(&self, key: &[u8]) -> Result<bool, StorageError> {
        let mut backend = self.backend.lock().await;
        Ok(backend
            .load(key)
            .await
            .map_err(StorageError::backend)?
            .is_some())
    }
}

#[async_trait::async_trait]
impl<A, Backend> Availability for CachedAvailability<A, Backend>
where
    A: Availability,
    Backend: StorageBackend + Send + Sync,
{
    async fn shares_available(&self, root: &Root) -> Result<(), AvailabilityError> {
        let key = sampling_result_key(root);
        if self.is_cached(&key).await? {
            debug!(root = %root.hash_hex(), "Availability already confirmed");
            return Ok(());
        }
        self.inner.shares_available(root).await?;
        let value = Backend::SerdeOperator::serialize(&true).map_err(StorageError::serde)?;
        self.backend
            .lock()
            .await
            .store(key, value)
            .await
            .map_err(StorageError::backend)?;
        Ok(())
    }
}
