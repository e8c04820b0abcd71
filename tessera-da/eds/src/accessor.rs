// std
use std::io::Read;
use std::sync::Arc;
// crates
use bytes::Bytes;
use cid::Cid;
use tessera_core::{DynError, ExtendedDataSquare};
// internal
use crate::blockstore::EdsBlockstore;

#[derive(Debug, thiserror::Error)]
pub enum AccessorError {
    #[error("accessor is closed")]
    Closed,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Wire(#[from] tessera_core::wire::Error),
    #[error(transparent)]
    Other(DynError),
}

/// Read only view over the nodes of a square, addressed by content identifier.
pub trait Blockstore: Send + Sync {
    fn has(&self, cid: &Cid) -> bool;
    /// Node in wire format.
    fn get(&self, cid: &Cid) -> Option<Bytes>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Opened handle to the data of one extended data square.
pub trait Accessor: Send + Sync + 'static {
    /// Reader over the encoded square.
    fn reader(&self) -> Result<Box<dyn Read + Send + '_>, AccessorError>;

    fn square(&self) -> Result<Arc<ExtendedDataSquare>, AccessorError>;

    /// Builds the node view of the square. Every call builds a new one.
    fn blockstore(&self) -> Result<Arc<dyn Blockstore>, AccessorError> {
        let square = self.square()?;
        let blockstore = EdsBlockstore::from_square(&square)
            .map_err(|e| AccessorError::Other(Box::new(e)))?;
        Ok(Arc::new(blockstore))
    }

    /// Releases the underlying resource.
    fn close(&self) -> Result<(), AccessorError>;
}
