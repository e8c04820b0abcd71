//! Helpers to build squares and serve them from memory in tests.

// std
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};
// crates
use rand::Rng;
use tessera_nmt::simple_merkle::Hash;
// internal
use crate::blob::Blob;
use crate::codec::ReedSolomonCodec;
use crate::eds::{Axis, ExtendedDataSquare};
use crate::getter::{
    get_share_with_proof, get_shares_by_namespace, GetterError, HeaderGetter, NamespacedShares,
    ShareGetter, ShareWithProof,
};
use crate::header::ExtendedHeader;
use crate::namespace::Namespace;
use crate::root::Root;
use crate::share::Share;
use crate::square::DataSquareBuilder;

pub fn namespace(last: u8) -> Namespace {
    Namespace::new([0, 0, 0, 0, 0, 0, 0x10, last])
}

pub fn random_blob(rng: &mut impl Rng, namespace: Namespace, len: usize) -> Blob {
    let mut data = vec![0u8; len];
    rng.fill(data.as_mut_slice());
    Blob::new(namespace, data).expect("valid test blob")
}

pub fn build_eds(blobs: Vec<Blob>) -> (ExtendedDataSquare, Root) {
    let square = DataSquareBuilder::with_blobs(blobs)
        .build()
        .expect("square fits");
    let eds = ExtendedDataSquare::compute(square.into_shares(), &ReedSolomonCodec)
        .expect("extendable square");
    let root = Root::from_eds(&eds).expect("computable roots");
    (eds, root)
}

/// Serves squares from memory, optionally withholding some coordinates.
#[derive(Default)]
pub struct MemoryShareGetter {
    squares: RwLock<HashMap<Hash, ExtendedDataSquare>>,
    withheld: RwLock<HashSet<(usize, usize)>>,
}

impl MemoryShareGetter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, eds: ExtendedDataSquare) -> Root {
        let root = Root::from_eds(&eds).expect("computable roots");
        self.squares
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(root.hash(), eds);
        root
    }

    pub fn withhold(&self, row: usize, col: usize) {
        self.withheld
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((row, col));
    }

    fn square(&self, root: &Root) -> Result<ExtendedDataSquare, GetterError> {
        self.squares
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&root.hash())
            .cloned()
            .ok_or(GetterError::NotFound)
    }

    fn is_withheld(&self, row: usize, col: usize) -> bool {
        self.withheld
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(row, col))
    }
}

#[async_trait::async_trait]
impl ShareGetter for MemoryShareGetter {
    async fn get_share(&self, root: &Root, row: usize, col: usize) -> Result<Share, GetterError> {
        if self.is_withheld(row, col) {
            return Err(GetterError::NotFound);
        }
        Ok(self.square(root)?.share(row, col)?.clone())
    }

    async fn get_share_with_proof(
        &self,
        root: &Root,
        row: usize,
        col: usize,
        axis: Axis,
    ) -> Result<ShareWithProof, GetterError> {
        if self.is_withheld(row, col) {
            return Err(GetterError::NotFound);
        }
        get_share_with_proof(&self.square(root)?, row, col, axis)
    }

    async fn get_eds(&self, root: &Root) -> Result<ExtendedDataSquare, GetterError> {
        if !self
            .withheld
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
        {
            return Err(GetterError::NotFound);
        }
        self.square(root)
    }

    async fn get_shares_by_namespace(
        &self,
        root: &Root,
        namespace: &Namespace,
    ) -> Result<NamespacedShares, GetterError> {
        get_shares_by_namespace(&self.square(root)?, root, namespace)
    }
}

#[derive(Default)]
pub struct MemoryHeaderGetter {
    headers: RwLock<HashMap<u64, ExtendedHeader>>,
}

impl MemoryHeaderGetter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, header: ExtendedHeader) {
        self.headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(header.height, header);
    }
}

#[async_trait::async_trait]
impl HeaderGetter for MemoryHeaderGetter {
    async fn get_by_height(&self, height: u64) -> Result<ExtendedHeader, GetterError> {
        self.headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&height)
            .cloned()
            .ok_or(GetterError::NotFound)
    }
}
