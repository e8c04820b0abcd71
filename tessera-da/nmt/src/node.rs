// internal
use crate::hasher::{
    NamespaceId, NamespacedDigest, NamespacedHasher, LEAF_PREFIX, NAMESPACED_HASH_SIZE,
    NAMESPACE_SIZE, NODE_PREFIX,
};
use crate::NmtError;

/// Namespaced Merkle tree node in its content addressed form.
///
/// Encoded as `[prefix] || payload` where the prefix tells leaves (`namespace || data`)
/// apart from inner nodes (`left digest || right digest`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NmtNode {
    Leaf(Vec<u8>),
    Inner {
        left: NamespacedDigest,
        right: NamespacedDigest,
    },
}

impl NmtNode {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Leaf(data) => {
                let mut out = Vec::with_capacity(1 + data.len());
                out.push(LEAF_PREFIX);
                out.extend_from_slice(data);
                out
            }
            Self::Inner { left, right } => {
                let mut out = Vec::with_capacity(1 + 2 * NAMESPACED_HASH_SIZE);
                out.push(NODE_PREFIX);
                out.extend_from_slice(&left.to_array());
                out.extend_from_slice(&right.to_array());
                out
            }
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, NmtError> {
        let Some((prefix, payload)) = bytes.split_first() else {
            return Err(NmtError::MalformedNode("empty node".into()));
        };
        match *prefix {
            LEAF_PREFIX => {
                if payload.len() < NAMESPACE_SIZE {
                    return Err(NmtError::MalformedNode(format!(
                        "leaf of {} bytes",
                        payload.len()
                    )));
                }
                Ok(Self::Leaf(payload.to_vec()))
            }
            NODE_PREFIX => {
                if payload.len() != 2 * NAMESPACED_HASH_SIZE {
                    return Err(NmtError::MalformedNode(format!(
                        "inner node of {} bytes",
                        payload.len()
                    )));
                }
                let (left, right) = payload.split_at(NAMESPACED_HASH_SIZE);
                Ok(Self::Inner {
                    left: NamespacedDigest::from_bytes(left)?,
                    right: NamespacedDigest::from_bytes(right)?,
                })
            }
            other => Err(NmtError::MalformedNode(format!("unknown prefix {other:#04x}"))),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    pub fn namespace(&self) -> Result<NamespaceId, NmtError> {
        match self {
            Self::Leaf(data) => NamespaceId::of_leaf(data),
            Self::Inner { left, .. } => Ok(left.min_namespace),
        }
    }

    pub fn digest(&self, hasher: &NamespacedHasher) -> Result<NamespacedDigest, NmtError> {
        match self {
            Self::Leaf(data) => hasher.hash_leaf(data),
            Self::Inner { left, right } => hasher.hash_node(left, right),
        }
    }
}

/// Digest of a node given in its encoded form.
pub fn hash_encoded_node(
    hasher: &NamespacedHasher,
    bytes: &[u8],
) -> Result<NamespacedDigest, NmtError> {
    NmtNode::decode(bytes)?.digest(hasher)
}
