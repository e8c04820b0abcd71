// std
use std::sync::Arc;
// crates
use tessera_core::getter::{
    get_share_with_proof, get_shares_by_namespace, GetterError, NamespacedShares, ShareGetter,
    ShareWithProof,
};
use tessera_core::{Axis, ExtendedDataSquare, Namespace, Root, Share};
// internal
use crate::accessor::Accessor;
use crate::store::{EdsStore, StoreError};

/// Serves shares out of the squares kept by an [`EdsStore`].
#[derive(Clone)]
pub struct StoreGetter {
    store: Arc<EdsStore>,
}

impl StoreGetter {
    pub fn new(store: Arc<EdsStore>) -> Self {
        Self { store }
    }

    async fn square(&self, root: &Root) -> Result<Arc<ExtendedDataSquare>, GetterError> {
        let accessor = self.store.accessor(root).await.map_err(|e| match e {
            StoreError::NotFound(_) => GetterError::NotFound,
            e => GetterError::Other(Box::new(e)),
        })?;
        let square = accessor
            .square()
            .map_err(|e| GetterError::Other(Box::new(e)))?;
        Ok(square)
    }
}

#[async_trait::async_trait]
impl ShareGetter for StoreGetter {
    async fn get_share(&self, root: &Root, row: usize, col: usize) -> Result<Share, GetterError> {
        Ok(self.square(root).await?.share(row, col)?.clone())
    }

    async fn get_share_with_proof(
        &self,
        root: &Root,
        row: usize,
        col: usize,
        axis: Axis,
    ) -> Result<ShareWithProof, GetterError> {
        get_share_with_proof(&*self.square(root).await?, row, col, axis)
    }

    async fn get_eds(&self, root: &Root) -> Result<ExtendedDataSquare, GetterError> {
        Ok((*self.square(root).await?).clone())
    }

    async fn get_shares_by_namespace(
        &self,
        root: &Root,
        namespace: &Namespace,
    ) -> Result<NamespacedShares, GetterError> {
        get_shares_by_namespace(&*self.square(root).await?, root, namespace)
    }
}
