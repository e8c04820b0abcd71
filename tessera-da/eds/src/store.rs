// std
use std::path::PathBuf;
// crates
use serde::{Deserialize, Serialize};
use tessera_core::{DynError, ExtendedDataSquare, Root};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
// internal
use crate::cache::{AccessorCache, AccessorCacheSettings, CacheError, CachedAccessor};
use crate::file::FileAccessor;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("square {0} is not stored")]
    NotFound(String),
    #[error("square does not match root {0}")]
    RootMismatch(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Wire(#[from] tessera_core::wire::Error),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Other(DynError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdsStoreSettings {
    pub base_dir: PathBuf,
    pub cache: AccessorCacheSettings,
}

/// Extended data squares kept one file per root, served through an [`AccessorCache`].
pub struct EdsStore {
    base_dir: PathBuf,
    cache: AccessorCache<String>,
}

impl EdsStore {
    pub fn new(settings: EdsStoreSettings) -> Self {
        let EdsStoreSettings { base_dir, cache } = settings;
        Self {
            base_dir,
            cache: AccessorCache::new(cache),
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        let mut path = self.base_dir.clone();
        path.push(key);
        path
    }

    /// Persists `eds` under `root`, refusing squares that do not hash to it.
    pub async fn put(&self, root: &Root, eds: &ExtendedDataSquare) -> Result<(), StoreError> {
        let key = root.hash_hex();
        let computed = Root::from_eds(eds).map_err(|e| StoreError::Other(Box::new(e)))?;
        if &computed != root {
            return Err(StoreError::RootMismatch(key));
        }
        let path = self.path(&key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let data = tessera_core::wire::serialize(eds)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .await?;
        file.write_all(&data).await?;
        file.flush().await?;
        info!(root = %key, width = eds.width(), "Stored square");
        Ok(())
    }

    pub async fn has(&self, root: &Root) -> bool {
        tokio::fs::try_exists(self.path(&root.hash_hex()))
            .await
            .unwrap_or(false)
    }

    /// Accessor to the square of `root`, opened through the cache.
    pub async fn accessor(&self, root: &Root) -> Result<CachedAccessor, StoreError> {
        let key = root.hash_hex();
        let path = self.path(&key);
        if !tokio::fs::try_exists(&path).await? {
            return Err(StoreError::NotFound(key));
        }
        let accessor = self
            .cache
            .get_or_load(key, |_| {
                let path = path.clone();
                async move {
                    FileAccessor::open(path)
                        .await
                        .map_err(|e| Box::new(e) as DynError)
                }
            })
            .await?;
        Ok(accessor)
    }

    pub async fn remove(&self, root: &Root) -> Result<(), StoreError> {
        let key = root.hash_hex();
        if self.cache.remove(&key).await.is_err() {
            debug!(root = %key, "Square was not cached");
        }
        match tokio::fs::remove_file(self.path(&key)).await {
            Ok(()) => {
                debug!(root = %key, "Removed square");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound(key)),
            Err(e) => Err(e.into()),
        }
    }

    pub fn cache(&self) -> &AccessorCache<String> {
        &self.cache
    }
}
