// std
use std::marker::PhantomData;
use std::path::PathBuf;
// crates
use bytes::Bytes;
use serde::{Deserialize, Serialize};
// internal
use super::{StorageBackend, StorageSerde};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not open {path}: {source}")]
    Open { path: PathBuf, source: sled::Error },
    #[error(transparent)]
    Db(#[from] sled::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SledBackendSettings {
    /// Directory holding the database files
    pub db_path: PathBuf,
}

/// On disk backend. Every write is flushed before it is acknowledged.
pub struct SledBackend<SerdeOp> {
    db: sled::Db,
    _serde_op: PhantomData<SerdeOp>,
}

impl<SerdeOp> std::fmt::Debug for SledBackend<SerdeOp> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledBackend")
            .field("entries", &self.db.len())
            .finish_non_exhaustive()
    }
}

impl<SerdeOp: StorageSerde + Send + Sync + 'static> StorageBackend for SledBackend<SerdeOp> {
    type Settings = SledBackendSettings;
    type Error = Error;
    type SerdeOperator = SerdeOp;

    fn new(config: Self::Settings) -> Result<Self, Self::Error> {
        let db = sled::open(&config.db_path).map_err(|source| Error::Open {
            path: config.db_path,
            source,
        })?;
        Ok(Self {
            db,
            _serde_op: PhantomData,
        })
    }

    async fn store(&mut self, key: Bytes, value: Bytes) -> Result<(), Self::Error> {
        self.db.insert(key.as_ref(), value.as_ref())?;
        self.db.flush_async().await?;
        Ok(())
    }

    async fn store_batch(&mut self, entries: Vec<(Bytes, Bytes)>) -> Result<(), Self::Error> {
        let batch = entries
            .into_iter()
            .fold(sled::Batch::default(), |mut batch, (key, value)| {
                batch.insert(key.as_ref(), value.as_ref());
                batch
            });
        self.db.apply_batch(batch)?;
        self.db.flush_async().await?;
        Ok(())
    }

    async fn load(&mut self, key: &[u8]) -> Result<Option<Bytes>, Self::Error> {
        Ok(self.db.get(key)?.map(|value| Bytes::copy_from_slice(&value)))
    }

    async fn remove(&mut self, key: &[u8]) -> Result<Option<Bytes>, Self::Error> {
        let removed = self.db.remove(key)?;
        self.db.flush_async().await?;
        Ok(removed.map(|value| Bytes::copy_from_slice(&value)))
    }
}
