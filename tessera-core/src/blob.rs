// crates
use serde::{Deserialize, Serialize};
use tessera_nmt::NmtError;
// internal
use crate::commitment::{create_commitment, Commitment};
use crate::namespace::{validate_blob_namespace, Namespace, NamespaceError};
use crate::share::{parse_sparse_shares, split_blob, Sequence, Share, ShareError, SHARE_VERSION_ZERO};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlobBuildError {
    #[error("blob data is empty")]
    EmptyData,
    #[error(transparent)]
    Namespace(#[from] NamespaceError),
    #[error(transparent)]
    Share(#[from] ShareError),
    #[error(transparent)]
    Nmt(#[from] NmtError),
    #[error("commitment does not match the blob data")]
    CommitmentMismatch,
}

/// Namespaced user payload together with its commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBlob")]
pub struct Blob {
    pub namespace: Namespace,
    #[serde(with = "tessera_utils::serde::hex_bytes")]
    pub data: Vec<u8>,
    pub share_version: u8,
    pub commitment: Commitment,
}

#[derive(Deserialize)]
struct RawBlob {
    namespace: Namespace,
    #[serde(with = "tessera_utils::serde::hex_bytes")]
    data: Vec<u8>,
    share_version: u8,
    commitment: Commitment,
}

impl TryFrom<RawBlob> for Blob {
    type Error = BlobBuildError;

    fn try_from(raw: RawBlob) -> Result<Self, Self::Error> {
        let blob = Self::with_share_version(raw.namespace, raw.data, raw.share_version)?;
        if blob.commitment != raw.commitment {
            return Err(BlobBuildError::CommitmentMismatch);
        }
        Ok(blob)
    }
}

impl Blob {
    pub fn new(namespace: Namespace, data: Vec<u8>) -> Result<Self, BlobBuildError> {
        Self::with_share_version(namespace, data, SHARE_VERSION_ZERO)
    }

    pub fn with_share_version(
        namespace: Namespace,
        data: Vec<u8>,
        share_version: u8,
    ) -> Result<Self, BlobBuildError> {
        validate_blob_namespace(&namespace)?;
        if data.is_empty() {
            return Err(BlobBuildError::EmptyData);
        }
        let shares = split_blob(namespace, &data, share_version)?;
        let commitment = create_commitment(&namespace, &shares)?;
        Ok(Self {
            namespace,
            data,
            share_version,
            commitment,
        })
    }

    pub fn to_shares(&self) -> Result<Vec<Share>, ShareError> {
        split_blob(self.namespace, &self.data, self.share_version)
    }

    /// Rebuilds a blob from a decoded sequence, recomputing its commitment.
    pub fn from_sequence(sequence: Sequence) -> Result<Self, BlobBuildError> {
        Self::with_share_version(sequence.namespace, sequence.data, sequence.share_version)
    }

    /// Size in shares once laid out in a square.
    pub fn shares_len(&self) -> usize {
        crate::share::sparse_shares_needed(self.data.len() as u32)
    }
}

/// Decodes every blob in `shares`, padding excluded.
pub fn shares_to_blobs(shares: &[Share]) -> Result<Vec<Blob>, BlobBuildError> {
    parse_sparse_shares(shares)?
        .into_iter()
        .map(Blob::from_sequence)
        .collect()
}
