//! RFC-6962 binary Merkle tree over byte slices, used for commitments and header hashes.

// crates
use sha2::{Digest, Sha256};
use tessera_utils::math::split_point;
// internal
use crate::hasher::{HASH_SIZE, LEAF_PREFIX, NODE_PREFIX};

pub type Hash = [u8; HASH_SIZE];

pub fn empty_hash() -> Hash {
    Sha256::digest(b"").into()
}

pub fn leaf_hash(leaf: &[u8]) -> Hash {
    Sha256::new()
        .chain_update([LEAF_PREFIX])
        .chain_update(leaf)
        .finalize()
        .into()
}

pub fn inner_hash(left: &Hash, right: &Hash) -> Hash {
    Sha256::new()
        .chain_update([NODE_PREFIX])
        .chain_update(left)
        .chain_update(right)
        .finalize()
        .into()
}

pub fn hash_from_byte_slices<T: AsRef<[u8]>>(items: &[T]) -> Hash {
    match items {
        [] => empty_hash(),
        [item] => leaf_hash(item.as_ref()),
        _ => {
            let k = split_point(items.len());
            let left = hash_from_byte_slices(&items[..k]);
            let right = hash_from_byte_slices(&items[k..]);
            inner_hash(&left, &right)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_empty_and_single() {
        let empty: [&[u8]; 0] = [];
        assert_eq!(hash_from_byte_slices(&empty), empty_hash());
        assert_eq!(hash_from_byte_slices(&[b"a"]), leaf_hash(b"a"));
        assert_ne!(leaf_hash(b""), empty_hash());
    }

    #[test]
    fn test_unbalanced_split() {
        let items = [b"a", b"b", b"c"];
        let expected = inner_hash(
            &inner_hash(&leaf_hash(b"a"), &leaf_hash(b"b")),
            &leaf_hash(b"c"),
        );
        assert_eq!(hash_from_byte_slices(&items), expected);
    }

    #[test]
    fn test_known_empty_hash() {
        assert_eq!(
            const_hex::encode(empty_hash()),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
