pub mod config;

// std
use std::sync::Arc;
// crates
use tessera_blob_service::{BlobService, TxSubmitter};
use tessera_core::{ExtendedDataSquare, ExtendedHeader};
use tessera_da_sampling::{
    Availability, AvailabilityError, CachedAvailability, FullAvailability, LightAvailability,
};
use tessera_eds::store::StoreError;
use tessera_eds::{EdsStore, StoreGetter};
use tessera_storage::backends::sled::{SledBackend, SledBackendSettings};
use tessera_storage::backends::StorageBackend;
use tessera_storage::{HeaderStore, StorageError, WireSerde};
use tessera_tracing::{DynError, WorkerGuard};
use tracing::info;
// internal
pub use config::{AvailabilityMode, Config, ConfigError};

pub type Backend = SledBackend<WireSerde>;
pub type Headers = HeaderStore<Backend>;

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not open database: {0}")]
    Database(#[from] tessera_storage::backends::sled::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("header {height} does not match its square")]
    HeaderMismatch { height: u64 },
    #[error("could not set up tracing: {0}")]
    Tracing(DynError),
}

/// Installs the configured subscriber. Logs written through a file or writer layer are flushed
/// until the returned guard is dropped.
pub fn init_tracing(config: &Config) -> Result<Option<WorkerGuard>, NodeError> {
    tessera_tracing::init(&config.tracing).map_err(NodeError::Tracing)
}

/// Every data availability component, wired from one [`Config`].
pub struct Node<Submitter> {
    pub headers: Arc<Headers>,
    pub eds: Arc<EdsStore>,
    pub getter: Arc<StoreGetter>,
    pub blobs: BlobService<Headers, StoreGetter, Submitter>,
    pub availability: CachedAvailability<Arc<dyn Availability>, Backend>,
}

impl<Submitter: TxSubmitter + 'static> Node<Submitter> {
    pub fn new(config: Config, submitter: Arc<Submitter>) -> Result<Self, NodeError> {
        config.validate()?;
        let Config {
            storage,
            eds,
            availability,
            sampling,
            full_availability,
            blob,
            ..
        } = config;

        let header_db = Backend::new(SledBackendSettings {
            db_path: storage.db_path.join("headers"),
        })?;
        let sampling_db = Backend::new(SledBackendSettings {
            db_path: storage.db_path.join("sampling"),
        })?;
        let headers = Arc::new(HeaderStore::new(header_db, storage.height_index));
        let eds = Arc::new(EdsStore::new(eds));
        let getter = Arc::new(StoreGetter::new(Arc::clone(&eds)));

        let inner: Arc<dyn Availability> = match availability {
            AvailabilityMode::Light => {
                Arc::new(LightAvailability::new(Arc::clone(&getter), sampling))
            }
            AvailabilityMode::Full => Arc::new(FullAvailability::new(
                Arc::clone(&getter),
                full_availability,
            )),
        };
        let blobs = BlobService::new(Arc::clone(&headers), Arc::clone(&getter), submitter, blob);
        info!(mode = ?availability, "Node components ready");

        Ok(Self {
            headers,
            eds,
            getter,
            blobs,
            availability: CachedAvailability::new(inner, sampling_db),
        })
    }

    /// Stores a square and then the header committing to it.
    pub async fn import(
        &self,
        header: &ExtendedHeader,
        square: &ExtendedDataSquare,
    ) -> Result<(), NodeError> {
        if let Err(e) = self.eds.put(&header.dah, square).await {
            return Err(match e {
                StoreError::RootMismatch(_) => NodeError::HeaderMismatch {
                    height: header.height,
                },
                e => e.into(),
            });
        }
        self.headers.append(std::slice::from_ref(header)).await?;
        info!(height = header.height, root = %header.dah.hash_hex(), "Imported block");
        Ok(())
    }

    pub async fn shares_available(&self, header: &ExtendedHeader) -> Result<(), AvailabilityError> {
        self.availability.shares_available(&header.dah).await
    }
}
