// std
use std::fmt::{Debug, Display, Formatter};
// crates
use serde::{Deserialize, Serialize};
use tessera_nmt::simple_merkle::{hash_from_byte_slices, Hash};
use tessera_nmt::{NamespaceMerkleTree, NamespacedHasher, NmtError};
use tessera_utils::math::{ceil_sqrt, round_down_power_of_two, round_up_power_of_two};
// internal
use crate::namespace::Namespace;
use crate::share::Share;

/// Merkle root over the subtree roots of a blob's shares.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment(
    #[serde(with = "tessera_utils::serde::hex_array")]
    Hash,
);

impl Commitment {
    pub const fn new(hash: Hash) -> Self {
        Self(hash)
    }

    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }
}

impl From<Hash> for Commitment {
    fn from(hash: Hash) -> Self {
        Self(hash)
    }
}

impl Debug for Commitment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Commitment({})", const_hex::encode(self.0))
    }
}

impl Display for Commitment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&const_hex::encode(self.0))
    }
}

/// Width of the smallest square able to hold `share_count` shares.
pub fn min_square_size(share_count: usize) -> usize {
    round_up_power_of_two(ceil_sqrt(share_count))
}

/// Splits `total` leaves into perfect subtrees no wider than `max_tree_size`, left to right.
pub fn merkle_mountain_range_sizes(mut total: usize, max_tree_size: usize) -> Vec<usize> {
    let mut sizes = Vec::new();
    while total != 0 {
        let size = if total >= max_tree_size {
            max_tree_size
        } else {
            round_down_power_of_two(total)
        };
        sizes.push(size);
        total -= size;
    }
    sizes
}

pub fn create_commitment(namespace: &Namespace, shares: &[Share]) -> Result<Commitment, NmtError> {
    let tree_sizes = merkle_mountain_range_sizes(shares.len(), min_square_size(shares.len()));
    let mut cursor = 0;
    let mut subtree_roots = Vec::with_capacity(tree_sizes.len());
    for size in tree_sizes {
        let mut tree = NamespaceMerkleTree::with_capacity(NamespacedHasher::default(), size);
        for share in &shares[cursor..cursor + size] {
            tree.push([namespace.as_ref(), share.as_bytes()].concat())?;
        }
        subtree_roots.push(tree.root().to_array());
        cursor += size;
    }
    Ok(Commitment(hash_from_byte_slices(&subtree_roots)))
}
