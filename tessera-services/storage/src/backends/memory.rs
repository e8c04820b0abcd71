// std
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::marker::PhantomData;
// crates
use bytes::Bytes;
// internal
use super::{StorageBackend, StorageSerde};

#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryBackendSettings;

/// In memory backend, keys kept in byte order.
pub struct MemoryBackend<SerdeOp> {
    inner: BTreeMap<Bytes, Bytes>,
    _serde_op: PhantomData<SerdeOp>,
}

impl<SerdeOp> core::fmt::Debug for MemoryBackend<SerdeOp> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MemoryBackend {{ entries: {} }}", self.inner.len())
    }
}

impl<SerdeOp> MemoryBackend<SerdeOp> {
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<SerdeOp: StorageSerde + Send + Sync + 'static> StorageBackend for MemoryBackend<SerdeOp> {
    type Settings = MemoryBackendSettings;
    type Error = Infallible;
    type SerdeOperator = SerdeOp;

    fn new(_config: Self::Settings) -> Result<Self, Self::Error> {
        Ok(Self {
            inner: BTreeMap::new(),
            _serde_op: Default::default(),
        })
    }

    async fn store(&mut self, key: Bytes, value: Bytes) -> Result<(), Self::Error> {
        let _ = self.inner.insert(key, value);
        Ok(())
    }

    async fn store_batch(&mut self, entries: Vec<(Bytes, Bytes)>) -> Result<(), Self::Error> {
        self.inner.extend(entries);
        Ok(())
    }

    async fn load(&mut self, key: &[u8]) -> Result<Option<Bytes>, Self::Error> {
        Ok(self.inner.get(key).cloned())
    }

    async fn remove(&mut self, key: &[u8]) -> Result<Option<Bytes>, Self::Error> {
        Ok(self.inner.remove(key))
    }
}
