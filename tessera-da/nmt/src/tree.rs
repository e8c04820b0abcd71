// crates
use tessera_utils::math::split_point;
// internal
use crate::hasher::{NamespaceId, NamespacedDigest, NamespacedHasher};
use crate::node::NmtNode;
use crate::proof::NamespaceProof;
use crate::NmtError;

/// In memory namespaced Merkle tree.
///
/// Leaves are `namespace || data` and must be pushed in ascending namespace order. The tree
/// shape follows RFC-6962: a range of `n` leaves is split at the largest power of two below `n`.
#[derive(Clone, Debug)]
pub struct NamespaceMerkleTree {
    hasher: NamespacedHasher,
    leaves: Vec<Vec<u8>>,
    leaf_hashes: Vec<NamespacedDigest>,
}

impl Default for NamespaceMerkleTree {
    fn default() -> Self {
        Self::new(NamespacedHasher::default())
    }
}

impl NamespaceMerkleTree {
    pub fn new(hasher: NamespacedHasher) -> Self {
        Self {
            hasher,
            leaves: Vec::new(),
            leaf_hashes: Vec::new(),
        }
    }

    pub fn with_capacity(hasher: NamespacedHasher, capacity: usize) -> Self {
        Self {
            hasher,
            leaves: Vec::with_capacity(capacity),
            leaf_hashes: Vec::with_capacity(capacity),
        }
    }

    pub fn hasher(&self) -> &NamespacedHasher {
        &self.hasher
    }

    pub fn push(&mut self, leaf: impl Into<Vec<u8>>) -> Result<(), NmtError> {
        let leaf = leaf.into();
        let digest = self.hasher.hash_leaf(&leaf)?;
        if let Some(last) = self.leaf_hashes.last() {
            if digest.min_namespace < last.min_namespace {
                return Err(NmtError::UnorderedLeaves {
                    last: last.min_namespace,
                    pushed: digest.min_namespace,
                });
            }
        }
        self.leaves.push(leaf);
        self.leaf_hashes.push(digest);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn leaves(&self) -> &[Vec<u8>] {
        &self.leaves
    }

    pub fn leaf_hashes(&self) -> &[NamespacedDigest] {
        &self.leaf_hashes
    }

    /// Smallest namespace pushed so far, as opposed to the root range which may ignore parity.
    pub fn min_namespace(&self) -> Option<NamespaceId> {
        self.leaf_hashes.first().map(|digest| digest.min_namespace)
    }

    pub fn max_namespace(&self) -> Option<NamespaceId> {
        self.leaf_hashes.last().map(|digest| digest.min_namespace)
    }

    pub fn root(&self) -> NamespacedDigest {
        if self.leaf_hashes.is_empty() {
            return NamespacedDigest::empty_root();
        }
        self.subtree_root(0, self.leaf_hashes.len())
    }

    fn subtree_root(&self, start: usize, end: usize) -> NamespacedDigest {
        if end - start == 1 {
            return self.leaf_hashes[start];
        }
        let k = split_point(end - start);
        let left = self.subtree_root(start, start + k);
        let right = self.subtree_root(start + k, end);
        self.hasher.combine(&left, &right)
    }

    /// Walks every node of the tree, leaves included, handing each digest with the node it
    /// was computed from. Returns the root.
    pub fn visit_nodes<F>(&self, mut visitor: F) -> NamespacedDigest
    where
        F: FnMut(&NamespacedDigest, NmtNode),
    {
        if self.leaf_hashes.is_empty() {
            return NamespacedDigest::empty_root();
        }
        self.visit(0, self.leaf_hashes.len(), &mut visitor)
    }

    fn visit(
        &self,
        start: usize,
        end: usize,
        visitor: &mut dyn FnMut(&NamespacedDigest, NmtNode),
    ) -> NamespacedDigest {
        if end - start == 1 {
            let digest = self.leaf_hashes[start];
            visitor(&digest, NmtNode::Leaf(self.leaves[start].clone()));
            return digest;
        }
        let k = split_point(end - start);
        let left = self.visit(start, start + k, visitor);
        let right = self.visit(start + k, end, visitor);
        let digest = self.hasher.combine(&left, &right);
        visitor(&digest, NmtNode::Inner { left, right });
        digest
    }

    /// Proof for the leaves in `[start, end)`.
    pub fn prove_range(&self, start: usize, end: usize) -> Result<NamespaceProof, NmtError> {
        if start >= end || end > self.leaf_hashes.len() {
            return Err(NmtError::InvalidRange {
                start,
                end,
                size: self.leaf_hashes.len(),
            });
        }
        Ok(NamespaceProof::inclusion(
            start,
            end,
            self.range_proof_nodes(start, end),
            self.hasher.ignores_max_namespace(),
        ))
    }

    /// Proof for all the leaves of `namespace`.
    ///
    /// If the namespace is absent but inside the tree range, the proof is an absence proof
    /// carrying the hash of the leaf sitting where the namespace would be.
    /// Outside the range the proof is empty.
    pub fn prove_namespace(&self, namespace: &NamespaceId) -> NamespaceProof {
        let ignore_max_namespace = self.hasher.ignores_max_namespace();
        let (Some(min), Some(max)) = (self.min_namespace(), self.max_namespace()) else {
            return NamespaceProof::empty(ignore_max_namespace);
        };
        if *namespace < min || max < *namespace {
            return NamespaceProof::empty(ignore_max_namespace);
        }
        match self.namespace_range(namespace) {
            Some((start, end)) => NamespaceProof::inclusion(
                start,
                end,
                self.range_proof_nodes(start, end),
                ignore_max_namespace,
            ),
            None => {
                // first leaf with a greater namespace, it exists since `namespace < max`
                let index = self
                    .leaf_hashes
                    .partition_point(|digest| digest.min_namespace < *namespace);
                NamespaceProof::absence(
                    index,
                    index + 1,
                    self.range_proof_nodes(index, index + 1),
                    self.leaf_hashes[index],
                    ignore_max_namespace,
                )
            }
        }
    }

    /// Leaves of `namespace` together with the proof that they are all of them.
    pub fn get_with_proof(&self, namespace: &NamespaceId) -> (Vec<Vec<u8>>, NamespaceProof) {
        let proof = self.prove_namespace(namespace);
        let leaves = if proof.is_of_absence() {
            Vec::new()
        } else {
            self.leaves[proof.start()..proof.end()].to_vec()
        };
        (leaves, proof)
    }

    fn namespace_range(&self, namespace: &NamespaceId) -> Option<(usize, usize)> {
        let start = self
            .leaf_hashes
            .partition_point(|digest| digest.min_namespace < *namespace);
        let end = self
            .leaf_hashes
            .partition_point(|digest| digest.min_namespace <= *namespace);
        (start < end).then_some((start, end))
    }

    fn range_proof_nodes(&self, proof_start: usize, proof_end: usize) -> Vec<NamespacedDigest> {
        let mut nodes = Vec::new();
        let full_tree_size = match self.leaf_hashes.len() {
            0 | 1 => 1,
            n => split_point(n) * 2,
        };
        self.collect_proof_nodes(
            0,
            full_tree_size,
            proof_start,
            proof_end,
            true,
            &mut nodes,
        );
        nodes
    }

    fn collect_proof_nodes(
        &self,
        start: usize,
        end: usize,
        proof_start: usize,
        proof_end: usize,
        include_node: bool,
        nodes: &mut Vec<NamespacedDigest>,
    ) -> Option<NamespacedDigest> {
        if start >= self.leaf_hashes.len() {
            return None;
        }
        let outside = end <= proof_start || start >= proof_end;
        let include_children = include_node && !outside;
        if end - start == 1 {
            let digest = self.leaf_hashes[start];
            if include_node && (start < proof_start || start >= proof_end) {
                nodes.push(digest);
            }
            return Some(digest);
        }
        let k = split_point(end - start);
        let left = self.collect_proof_nodes(
            start,
            start + k,
            proof_start,
            proof_end,
            include_children,
            nodes,
        );
        let right = self.collect_proof_nodes(
            start + k,
            end,
            proof_start,
            proof_end,
            include_children,
            nodes,
        );
        let digest = match (left, right) {
            (Some(left), Some(right)) => Some(self.hasher.combine(&left, &right)),
            (left, None) => left,
            (None, right) => right,
        };
        if include_node && !include_children {
            if let Some(digest) = digest {
                nodes.push(digest);
            }
        }
        digest
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hasher::NAMESPACE_SIZE;

    fn ns(last: u8) -> NamespaceId {
        let mut bytes = [0u8; NAMESPACE_SIZE];
        bytes[NAMESPACE_SIZE - 1] = last;
        NamespaceId::new(bytes)
    }

    fn tree_of(namespaces: &[u8]) -> NamespaceMerkleTree {
        let mut tree = NamespaceMerkleTree::new(NamespacedHasher::with_ignore_max_namespace(false));
        for (i, last) in namespaces.iter().enumerate() {
            tree.push([ns(*last).as_ref(), &[i as u8; 4]].concat())
                .unwrap();
        }
        tree
    }

    #[test]
    fn test_empty_root() {
        let tree = NamespaceMerkleTree::default();
        assert_eq!(tree.root(), NamespacedDigest::empty_root());
    }

    #[test]
    fn test_single_leaf_root_is_leaf_hash() {
        let tree = tree_of(&[4]);
        assert_eq!(tree.root(), tree.leaf_hashes()[0]);
    }

    #[test]
    fn test_root_shape() {
        let tree = tree_of(&[1, 2, 3]);
        let hasher = tree.hasher();
        let hashes = tree.leaf_hashes();
        let left = hasher.hash_node(&hashes[0], &hashes[1]).unwrap();
        let expected = hasher.hash_node(&left, &hashes[2]).unwrap();
        assert_eq!(tree.root(), expected);
        assert_eq!(tree.root().min_namespace, ns(1));
        assert_eq!(tree.root().max_namespace, ns(3));
    }

    #[test]
    fn test_push_order() {
        let mut tree = tree_of(&[1, 3]);
        assert!(matches!(
            tree.push([ns(2).as_ref(), b"late"].concat()),
            Err(NmtError::UnorderedLeaves { .. })
        ));
        assert!(tree.push([ns(3).as_ref(), b"same"].concat()).is_ok());
        assert!(matches!(tree.push(vec![0u8; 3]), Err(NmtError::LeafTooShort(3))));
    }

    #[test]
    fn test_visit_nodes() {
        let tree = tree_of(&[1, 1, 2, 5, 6]);
        let mut leaves = 0;
        let mut inner = 0;
        let root = tree.visit_nodes(|digest, node| {
            assert_eq!(node.digest(tree.hasher()).unwrap(), *digest);
            match node {
                NmtNode::Leaf(_) => leaves += 1,
                NmtNode::Inner { .. } => inner += 1,
            }
        });
        assert_eq!(root, tree.root());
        assert_eq!(leaves, 5);
        assert_eq!(inner, 4);
    }

    #[test]
    fn test_invalid_range() {
        let tree = tree_of(&[1, 2]);
        assert!(tree.prove_range(1, 1).is_err());
        assert!(tree.prove_range(0, 3).is_err());
    }

    #[test]
    fn test_get_with_proof() {
        let tree = tree_of(&[1, 2, 2, 2, 4, 4, 7, 9]);
        let (leaves, proof) = tree.get_with_proof(&ns(2));
        assert_eq!(leaves.len(), 3);
        assert_eq!((proof.start(), proof.end()), (1, 4));
        assert!(proof.verify_namespace(&ns(2), &leaves, &tree.root()).is_ok());

        let (leaves, proof) = tree.get_with_proof(&ns(5));
        assert!(leaves.is_empty());
        assert!(proof.is_of_absence());
        assert_eq!(proof.start(), 6);

        let (leaves, proof) = tree.get_with_proof(&ns(10));
        assert!(leaves.is_empty());
        assert!(proof.is_empty());
    }
}
