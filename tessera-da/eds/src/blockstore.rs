// std
use std::collections::HashMap;
// crates
use bytes::Bytes;
use cid::Cid;
use tessera_core::eds::{Axis, EdsError};
use tessera_core::ExtendedDataSquare;
use tessera_nmt::cid::{cid_from_digest, AddressError};
use tracing::debug;
// internal
use crate::accessor::Blockstore;

#[derive(Debug, thiserror::Error)]
pub enum BlockstoreError {
    #[error(transparent)]
    Eds(#[from] EdsError),
    #[error(transparent)]
    Address(#[from] AddressError),
}

/// Every leaf and inner node of every row and column tree of a square, keyed by address.
#[derive(Debug, Default, Clone)]
pub struct EdsBlockstore {
    nodes: HashMap<Cid, Bytes>,
}

impl EdsBlockstore {
    pub fn from_square(square: &ExtendedDataSquare) -> Result<Self, BlockstoreError> {
        let mut nodes = HashMap::new();
        let mut failure = None;
        for axis in [Axis::Row, Axis::Col] {
            for index in 0..square.width() {
                let tree = square.axis_tree(axis, index)?;
                tree.visit_nodes(|digest, node| {
                    if failure.is_some() {
                        return;
                    }
                    match cid_from_digest(digest) {
                        Ok(cid) => {
                            nodes.entry(cid).or_insert_with(|| node.encode().into());
                        }
                        Err(e) => failure = Some(e),
                    }
                });
                if let Some(e) = failure.take() {
                    return Err(e.into());
                }
            }
        }
        debug!(nodes = nodes.len(), width = square.width(), "Built square blockstore");
        Ok(Self { nodes })
    }
}

impl Blockstore for EdsBlockstore {
    fn has(&self, cid: &Cid) -> bool {
        self.nodes.contains_key(cid)
    }

    fn get(&self, cid: &Cid) -> Option<Bytes> {
        self.nodes.get(cid).cloned()
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tessera_core::testutils::{build_eds, namespace, random_blob};
    use tessera_nmt::cid::cid_of_encoded_node;
    use tessera_nmt::{NamespacedHasher, NmtNode};

    #[test]
    fn test_roots_are_reachable() {
        let mut rng = rand::thread_rng();
        let (eds, root) = build_eds(vec![random_blob(&mut rng, namespace(3), 1500)]);
        let blockstore = EdsBlockstore::from_square(&eds).unwrap();
        for digest in root.row_roots().iter().chain(root.column_roots()) {
            let cid = cid_from_digest(digest).unwrap();
            assert!(blockstore.has(&cid));
            let node = NmtNode::decode(&blockstore.get(&cid).unwrap()).unwrap();
            assert_eq!(&node.digest(&NamespacedHasher::default()).unwrap(), digest);
        }
    }

    #[test]
    fn test_nodes_address_themselves() {
        let (eds, _) = build_eds(vec![]);
        let blockstore = EdsBlockstore::from_square(&eds).unwrap();
        assert!(!blockstore.is_empty());
        for (cid, bytes) in &blockstore.nodes {
            assert_eq!(&cid_of_encoded_node(bytes).unwrap(), cid);
        }
    }
}
