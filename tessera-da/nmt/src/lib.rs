pub mod cid;
pub mod hasher;
pub mod node;
pub mod proof;
pub mod simple_merkle;
pub mod tree;

pub use hasher::{
    NamespaceId, NamespacedDigest, NamespacedHasher, HASH_SIZE, LEAF_PREFIX, NAMESPACED_HASH_SIZE,
    NAMESPACE_SIZE, NODE_PREFIX,
};
pub use node::NmtNode;
pub use proof::NamespaceProof;
pub use tree::NamespaceMerkleTree;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NmtError {
    #[error("malformed node: {0}")]
    MalformedNode(String),
    #[error("leaf of {0} bytes is shorter than a namespace")]
    LeafTooShort(usize),
    #[error("leaf namespace {pushed} pushed after {last}")]
    UnorderedLeaves {
        last: NamespaceId,
        pushed: NamespaceId,
    },
    #[error("left sibling max namespace {left_max} is greater than right sibling min namespace {right_min}")]
    UnorderedSiblings {
        left_max: NamespaceId,
        right_min: NamespaceId,
    },
    #[error("invalid range [{start}, {end}) for a tree of {size} leaves")]
    InvalidRange {
        start: usize,
        end: usize,
        size: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NmtSettings {
    pub namespace_size: usize,
}

impl Default for NmtSettings {
    fn default() -> Self {
        Self {
            namespace_size: NAMESPACE_SIZE,
        }
    }
}

impl NmtSettings {
    /// The namespace width is fixed at build time, configuration can only restate it.
    pub fn validate(&self) -> Result<(), String> {
        if self.namespace_size != NAMESPACE_SIZE {
            return Err(format!(
                "namespace size {} is not supported, this build uses {NAMESPACE_SIZE}",
                self.namespace_size
            ));
        }
        Ok(())
    }
}
