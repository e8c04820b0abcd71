// crates
use serde::{Deserialize, Serialize};
use tessera_nmt::NamespaceProof;

/// Row proofs of the shares of one blob, one per row the blob touches, top to bottom.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobProof(pub Vec<NamespaceProof>);

impl BlobProof {
    pub fn rows(&self) -> &[NamespaceProof] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<NamespaceProof>> for BlobProof {
    fn from(proofs: Vec<NamespaceProof>) -> Self {
        Self(proofs)
    }
}
