// std
use std::fmt::{Debug, Display, Formatter};
// crates
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
// internal
use crate::NmtError;

pub const NAMESPACE_SIZE: usize = 8;
pub const HASH_SIZE: usize = 32;
pub const NAMESPACED_HASH_SIZE: usize = 2 * NAMESPACE_SIZE + HASH_SIZE;

/// Domain separator of leaf nodes, first byte of the hashed and of the encoded leaf.
pub const LEAF_PREFIX: u8 = 0x00;
/// Domain separator of inner nodes.
pub const NODE_PREFIX: u8 = 0x01;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct NamespaceId(
    #[serde(with = "tessera_utils::serde::hex_array")]
    [u8; NAMESPACE_SIZE],
);

impl NamespaceId {
    pub const MIN: Self = Self([0; NAMESPACE_SIZE]);
    pub const MAX: Self = Self([0xff; NAMESPACE_SIZE]);

    pub const fn new(bytes: [u8; NAMESPACE_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, NmtError> {
        <[u8; NAMESPACE_SIZE]>::try_from(bytes)
            .map(Self)
            .map_err(|_| NmtError::MalformedNode(format!("namespace of {} bytes", bytes.len())))
    }

    /// Namespace prefix of a leaf or share.
    pub fn of_leaf(leaf: &[u8]) -> Result<Self, NmtError> {
        leaf.get(..NAMESPACE_SIZE)
            .ok_or(NmtError::LeafTooShort(leaf.len()))
            .and_then(Self::from_slice)
    }

    pub const fn as_bytes(&self) -> &[u8; NAMESPACE_SIZE] {
        &self.0
    }
}

impl AsRef<[u8]> for NamespaceId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; NAMESPACE_SIZE]> for NamespaceId {
    fn from(bytes: [u8; NAMESPACE_SIZE]) -> Self {
        Self(bytes)
    }
}

impl Debug for NamespaceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "NamespaceId({})", const_hex::encode(self.0))
    }
}

impl Display for NamespaceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&const_hex::encode(self.0))
    }
}

/// Output of the [`NamespacedHasher`]: the namespace range covered by a node and its hash.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct NamespacedDigest {
    pub min_namespace: NamespaceId,
    pub max_namespace: NamespaceId,
    pub hash: [u8; HASH_SIZE],
}

impl NamespacedDigest {
    pub const fn new(
        min_namespace: NamespaceId,
        max_namespace: NamespaceId,
        hash: [u8; HASH_SIZE],
    ) -> Self {
        Self {
            min_namespace,
            max_namespace,
            hash,
        }
    }

    /// Root of a tree without leaves.
    pub fn empty_root() -> Self {
        Self::new(
            NamespaceId::MIN,
            NamespaceId::MIN,
            Sha256::digest(b"").into(),
        )
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, NmtError> {
        if bytes.len() != NAMESPACED_HASH_SIZE {
            return Err(NmtError::MalformedNode(format!(
                "digest of {} bytes, expected {NAMESPACED_HASH_SIZE}",
                bytes.len()
            )));
        }
        let (min, rest) = bytes.split_at(NAMESPACE_SIZE);
        let (max, hash) = rest.split_at(NAMESPACE_SIZE);
        let digest = Self::new(
            NamespaceId::from_slice(min)?,
            NamespaceId::from_slice(max)?,
            hash.try_into()
                .map_err(|_| NmtError::MalformedNode("hash size".into()))?,
        );
        if digest.min_namespace > digest.max_namespace {
            return Err(NmtError::MalformedNode(format!(
                "min namespace {} greater than max namespace {}",
                digest.min_namespace, digest.max_namespace
            )));
        }
        Ok(digest)
    }

    pub fn to_array(&self) -> [u8; NAMESPACED_HASH_SIZE] {
        let mut out = [0u8; NAMESPACED_HASH_SIZE];
        out[..NAMESPACE_SIZE].copy_from_slice(self.min_namespace.as_bytes());
        out[NAMESPACE_SIZE..2 * NAMESPACE_SIZE].copy_from_slice(self.max_namespace.as_bytes());
        out[2 * NAMESPACE_SIZE..].copy_from_slice(&self.hash);
        out
    }

    pub fn contains(&self, namespace: &NamespaceId) -> bool {
        self.min_namespace <= *namespace && *namespace <= self.max_namespace
    }
}

impl Debug for NamespacedDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespacedDigest")
            .field("min_namespace", &self.min_namespace)
            .field("max_namespace", &self.max_namespace)
            .field("hash", &const_hex::encode(self.hash))
            .finish()
    }
}

impl Display for NamespacedDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&const_hex::encode(self.to_array()))
    }
}

impl Serialize for NamespacedDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        tessera_utils::serde::hex_array::serialize(&self.to_array(), serializer)
    }
}

impl<'de> Deserialize<'de> for NamespacedDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes: [u8; NAMESPACED_HASH_SIZE] =
            tessera_utils::serde::hex_array::deserialize(deserializer)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

/// Sha256 based namespaced hasher.
///
/// With `ignore_max_namespace` set, the reserved maximum namespace (used by erasure coded
/// parity leaves) is left out of the max range whenever other namespaces are present.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NamespacedHasher {
    ignore_max_namespace: bool,
}

impl Default for NamespacedHasher {
    fn default() -> Self {
        Self::with_ignore_max_namespace(true)
    }
}

impl NamespacedHasher {
    pub const fn with_ignore_max_namespace(ignore_max_namespace: bool) -> Self {
        Self {
            ignore_max_namespace,
        }
    }

    pub const fn ignores_max_namespace(&self) -> bool {
        self.ignore_max_namespace
    }

    /// Hashes a leaf whose first [`NAMESPACE_SIZE`] bytes are its namespace.
    pub fn hash_leaf(&self, leaf: &[u8]) -> Result<NamespacedDigest, NmtError> {
        let namespace = NamespaceId::of_leaf(leaf)?;
        let hash = Sha256::new()
            .chain_update([LEAF_PREFIX])
            .chain_update(leaf)
            .finalize();
        Ok(NamespacedDigest::new(namespace, namespace, hash.into()))
    }

    /// Hashes two siblings, rejecting them if they are not namespace ordered.
    pub fn hash_node(
        &self,
        left: &NamespacedDigest,
        right: &NamespacedDigest,
    ) -> Result<NamespacedDigest, NmtError> {
        if left.max_namespace > right.min_namespace {
            return Err(NmtError::UnorderedSiblings {
                left_max: left.max_namespace,
                right_min: right.min_namespace,
            });
        }
        Ok(self.combine(left, right))
    }

    pub(crate) fn combine(
        &self,
        left: &NamespacedDigest,
        right: &NamespacedDigest,
    ) -> NamespacedDigest {
        let min_namespace = left.min_namespace.min(right.min_namespace);
        let max_namespace = if self.ignore_max_namespace && left.min_namespace == NamespaceId::MAX
        {
            NamespaceId::MAX
        } else if self.ignore_max_namespace && right.min_namespace == NamespaceId::MAX {
            left.max_namespace
        } else {
            left.max_namespace.max(right.max_namespace)
        };
        let hash = Sha256::new()
            .chain_update([NODE_PREFIX])
            .chain_update(left.to_array())
            .chain_update(right.to_array())
            .finalize();
        NamespacedDigest::new(min_namespace, max_namespace, hash.into())
    }
}
