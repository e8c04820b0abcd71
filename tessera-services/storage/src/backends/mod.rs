pub mod memory;
#[cfg(feature = "sled")]
pub mod sled;

// std
use std::error::Error;
// crates
use bytes::Bytes;
use futures::Future;
use serde::{de::DeserializeOwned, Serialize};
// internal

/// Trait that defines how to translate from user types to the storage buffer type
pub trait StorageSerde {
    type Error: Error + Send + Sync + 'static;
    /// Dump a type as [`Bytes`]
    fn serialize<T: Serialize>(value: &T) -> Result<Bytes, Self::Error>;
    /// Load a type from [`Bytes`]
    fn deserialize<T: DeserializeOwned>(buff: &[u8]) -> Result<T, Self::Error>;
}

/// Values are encoded with the node wire format.
pub struct WireSerde;

impl StorageSerde for WireSerde {
    type Error = tessera_core::wire::Error;

    fn serialize<T: Serialize>(value: &T) -> Result<Bytes, Self::Error> {
        tessera_core::wire::serialize(value).map(Bytes::from)
    }

    fn deserialize<T: DeserializeOwned>(buff: &[u8]) -> Result<T, Self::Error> {
        tessera_core::wire::deserialize(buff)
    }
}

/// Ordered, byte keyed key value store.
pub trait StorageBackend: Sized {
    /// Backend settings
    type Settings: Clone + Send + Sync + 'static;
    /// Backend operations error type
    type Error: Error + 'static + Send + Sync;
    /// Operator to dump/load custom types into the defined backend store type [`Bytes`]
    type SerdeOperator: StorageSerde + Send + Sync + 'static;
    fn new(config: Self::Settings) -> Result<Self, Self::Error>;
    fn store(
        &mut self,
        key: Bytes,
        value: Bytes,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
    /// Writes every entry or none of them.
    fn store_batch(
        &mut self,
        entries: Vec<(Bytes, Bytes)>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
    fn load(
        &mut self,
        key: &[u8],
    ) -> impl Future<Output = Result<Option<Bytes>, Self::Error>> + Send;
    fn remove(
        &mut self,
        key: &[u8],
    ) -> impl Future<Output = Result<Option<Bytes>, Self::Error>> + Send;
}

#[cfg(test)]
pub mod testing {
    use super::StorageSerde;
    use bytes::Bytes;
    use serde::de::DeserializeOwned;
    use serde::Serialize;
    use thiserror::Error;

    pub struct NoStorageSerde;

    #[derive(Error, Debug)]
    #[error("Fake error")]
    pub struct NoError;

    impl StorageSerde for NoStorageSerde {
        type Error = NoError;

        fn serialize<T: Serialize>(_value: &T) -> Result<Bytes, Self::Error> {
            Ok(Bytes::new())
        }

        fn deserialize<T: DeserializeOwned>(_buff: &[u8]) -> Result<T, Self::Error> {
            Err(NoError)
        }
    }
}
