// crates
use serde::{Deserialize, Serialize};
use tessera_nmt::{NamespaceProof, NmtError, NAMESPACE_SIZE};
// internal
use crate::eds::{leaf_namespace, Axis, EdsError, ExtendedDataSquare};
use crate::header::ExtendedHeader;
use crate::namespace::Namespace;
use crate::root::Root;
use crate::share::{Share, ShareError};
use crate::DynError;

#[derive(Debug, thiserror::Error)]
pub enum GetterError {
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Eds(#[from] EdsError),
    #[error(transparent)]
    Share(#[from] ShareError),
    #[error(transparent)]
    Other(DynError),
}

impl GetterError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl From<NmtError> for GetterError {
    fn from(e: NmtError) -> Self {
        Self::Eds(e.into())
    }
}

/// Shares of a namespace found in one row, with the proof that they are all of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowNamespaceData {
    pub shares: Vec<Share>,
    pub proof: NamespaceProof,
}

impl RowNamespaceData {
    pub fn verify(&self, namespace: &Namespace, row_root: &tessera_nmt::NamespacedDigest) -> bool {
        let leaves: Vec<Vec<u8>> = self
            .shares
            .iter()
            .map(|share| [namespace.as_ref(), share.as_bytes()].concat())
            .collect();
        self.proof
            .verify_namespace(namespace, &leaves, row_root)
            .is_ok()
    }
}

/// Per row namespace data, in ascending row order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespacedShares(pub Vec<RowNamespaceData>);

impl NamespacedShares {
    pub fn flatten(&self) -> Vec<Share> {
        self.0
            .iter()
            .flat_map(|row| row.shares.iter().cloned())
            .collect()
    }

    pub fn rows(&self) -> &[RowNamespaceData] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|row| row.shares.is_empty())
    }

    /// Checks every row against the row roots covering `namespace`.
    pub fn verify(&self, root: &Root, namespace: &Namespace) -> bool {
        let rows: Vec<usize> = root.rows_with_namespace(namespace).collect();
        rows.len() == self.0.len()
            && rows
                .iter()
                .zip(&self.0)
                .all(|(index, data)| data.verify(namespace, &root.row_roots()[*index]))
    }
}

/// A share and its inclusion proof through the root of one of its axes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareWithProof {
    pub share: Share,
    pub proof: NamespaceProof,
    pub axis: Axis,
}

impl ShareWithProof {
    /// Verifies the share sits at (`row`, `col`) of the square committed to by `root`.
    pub fn validate(&self, root: &Root, row: usize, col: usize) -> bool {
        let (axis_index, share_index) = match self.axis {
            Axis::Row => (row, col),
            Axis::Col => (col, row),
        };
        let Some(axis_root) = root.axis_root(self.axis, axis_index) else {
            return false;
        };
        if self.proof.start() != share_index || self.proof.end() != share_index + 1 {
            return false;
        }
        let namespace = leaf_namespace(axis_index, share_index, root.width() / 2, &self.share);
        self.proof
            .verify_inclusion(&namespace, &[self.share.as_bytes()], axis_root)
            .is_ok()
    }
}

/// Fetches shares of a square given its root.
#[async_trait::async_trait]
pub trait ShareGetter: Send + Sync {
    async fn get_share(&self, root: &Root, row: usize, col: usize) -> Result<Share, GetterError>;

    /// Share at (`row`, `col`) with its proof through the given axis.
    async fn get_share_with_proof(
        &self,
        root: &Root,
        row: usize,
        col: usize,
        axis: Axis,
    ) -> Result<ShareWithProof, GetterError>;

    async fn get_eds(&self, root: &Root) -> Result<ExtendedDataSquare, GetterError>;

    async fn get_shares_by_namespace(
        &self,
        root: &Root,
        namespace: &Namespace,
    ) -> Result<NamespacedShares, GetterError>;
}

#[async_trait::async_trait]
pub trait HeaderGetter: Send + Sync {
    async fn get_by_height(&self, height: u64) -> Result<ExtendedHeader, GetterError>;
}

/// Collects the shares of `namespace` from every row that may hold it.
///
/// Rows whose range covers the namespace without holding it yield an absence proof and no shares.
pub fn get_shares_by_namespace(
    eds: &ExtendedDataSquare,
    root: &Root,
    namespace: &Namespace,
) -> Result<NamespacedShares, GetterError> {
    let mut rows = Vec::new();
    for index in root.rows_with_namespace(namespace) {
        let tree = eds.axis_tree(Axis::Row, index)?;
        let (leaves, proof) = tree.get_with_proof(namespace);
        let shares = leaves
            .into_iter()
            .map(|mut leaf| Share::from_bytes(leaf.split_off(NAMESPACE_SIZE)))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(RowNamespaceData { shares, proof });
    }
    Ok(NamespacedShares(rows))
}

pub fn get_share_with_proof(
    eds: &ExtendedDataSquare,
    row: usize,
    col: usize,
    axis: Axis,
) -> Result<ShareWithProof, GetterError> {
    let share = eds.share(row, col)?.clone();
    let (axis_index, share_index) = match axis {
        Axis::Row => (row, col),
        Axis::Col => (col, row),
    };
    let proof = eds
        .axis_tree(axis, axis_index)?
        .prove_range(share_index, share_index + 1)?;
    Ok(ShareWithProof { share, proof, axis })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::ReedSolomonCodec;
    use crate::namespace::namespace_from_hex;
    use crate::share::split_blob;
    use crate::square::DataSquareBuilder;
    use crate::Blob;

    fn square() -> (ExtendedDataSquare, Root, Namespace) {
        let namespace = namespace_from_hex("0000000000000042").unwrap();
        let other = namespace_from_hex("0000000000000050").unwrap();
        let original = DataSquareBuilder::with_blobs([
            Blob::new(namespace, vec![1u8; 1200]).unwrap(),
            Blob::new(other, vec![2u8; 100]).unwrap(),
        ])
        .build()
        .unwrap();
        let eds = ExtendedDataSquare::compute(original.into_shares(), &ReedSolomonCodec).unwrap();
        let root = Root::from_eds(&eds).unwrap();
        (eds, root, namespace)
    }

    #[test]
    fn test_namespace_retrieval_is_verifiable() {
        let (eds, root, namespace) = square();
        let shares = get_shares_by_namespace(&eds, &root, &namespace).unwrap();
        assert!(!shares.is_empty());
        assert!(shares.verify(&root, &namespace));
        assert_eq!(
            shares.flatten(),
            split_blob(namespace, &[1u8; 1200], 0).unwrap()
        );
    }

    #[test]
    fn test_absent_namespace_in_range() {
        let (eds, root, _) = square();
        let absent = namespace_from_hex("0000000000000045").unwrap();
        let shares = get_shares_by_namespace(&eds, &root, &absent).unwrap();
        assert!(shares.is_empty());
        assert!(shares.verify(&root, &absent));
    }

    #[test]
    fn test_share_proofs_for_every_coordinate() {
        let (eds, root, _) = square();
        for row in 0..eds.width() {
            for col in 0..eds.width() {
                for axis in [Axis::Row, Axis::Col] {
                    let sample = get_share_with_proof(&eds, row, col, axis).unwrap();
                    assert!(sample.validate(&root, row, col), "({row}, {col}) {axis:?}");
                }
            }
        }
        let sample = get_share_with_proof(&eds, 0, 0, Axis::Row).unwrap();
        assert!(!sample.validate(&root, 0, 1));
    }
}
