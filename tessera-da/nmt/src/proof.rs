// crates
use serde::{Deserialize, Serialize};
use tessera_utils::math::split_point;
// internal
use crate::hasher::{NamespaceId, NamespacedDigest, NamespacedHasher};
use crate::NmtError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProofError {
    #[error("proof range [{start}, {end}) is invalid")]
    InvalidRange { start: usize, end: usize },
    #[error("expected {expected} leaves, got {got}")]
    LeafCountMismatch { expected: usize, got: usize },
    #[error("leaf namespace {got} does not match {expected}")]
    NamespaceMismatch {
        expected: NamespaceId,
        got: NamespaceId,
    },
    #[error("proof nodes leave leaves of the namespace out")]
    Incomplete,
    #[error("absence proof leaf does not follow the namespace")]
    InvalidAbsenceLeaf,
    #[error("empty proof for a namespace inside the root range")]
    EmptyProofInRange,
    #[error("proof nodes are exhausted before the root")]
    MissingNodes,
    #[error("computed root does not match")]
    RootMismatch,
    #[error(transparent)]
    Nmt(#[from] NmtError),
}

/// Range proof of a namespaced Merkle tree.
///
/// `nodes` are the roots of the subtrees left and right of `[start, end)`, in order.
/// An absence proof carries the hash of the leaf occupying the spot of the missing namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceProof {
    start: usize,
    end: usize,
    nodes: Vec<NamespacedDigest>,
    leaf_hash: Option<NamespacedDigest>,
    ignore_max_namespace: bool,
}

impl NamespaceProof {
    pub fn empty(ignore_max_namespace: bool) -> Self {
        Self {
            start: 0,
            end: 0,
            nodes: Vec::new(),
            leaf_hash: None,
            ignore_max_namespace,
        }
    }

    pub fn inclusion(
        start: usize,
        end: usize,
        nodes: Vec<NamespacedDigest>,
        ignore_max_namespace: bool,
    ) -> Self {
        Self {
            start,
            end,
            nodes,
            leaf_hash: None,
            ignore_max_namespace,
        }
    }

    pub fn absence(
        start: usize,
        end: usize,
        nodes: Vec<NamespacedDigest>,
        leaf_hash: NamespacedDigest,
        ignore_max_namespace: bool,
    ) -> Self {
        Self {
            start,
            end,
            nodes,
            leaf_hash: Some(leaf_hash),
            ignore_max_namespace,
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn nodes(&self) -> &[NamespacedDigest] {
        &self.nodes
    }

    pub fn leaf_hash(&self) -> Option<&NamespacedDigest> {
        self.leaf_hash.as_ref()
    }

    pub fn is_of_absence(&self) -> bool {
        self.leaf_hash.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end && self.nodes.is_empty()
    }

    pub fn ignores_max_namespace(&self) -> bool {
        self.ignore_max_namespace
    }

    fn hasher(&self) -> NamespacedHasher {
        NamespacedHasher::with_ignore_max_namespace(self.ignore_max_namespace)
    }

    /// Verifies that `leaves` (namespace prefixed) are all the leaves of `namespace` under `root`.
    pub fn verify_namespace(
        &self,
        namespace: &NamespaceId,
        leaves: &[impl AsRef<[u8]>],
        root: &NamespacedDigest,
    ) -> Result<(), ProofError> {
        if leaves.is_empty() && self.is_empty() {
            // only acceptable when the namespace can not be under this root
            return if root.contains(namespace) {
                Err(ProofError::EmptyProofInRange)
            } else {
                Ok(())
            };
        }
        let hasher = self.hasher();
        let leaf_hashes = match &self.leaf_hash {
            Some(leaf_hash) => {
                if !leaves.is_empty() {
                    return Err(ProofError::LeafCountMismatch {
                        expected: 0,
                        got: leaves.len(),
                    });
                }
                if leaf_hash.min_namespace <= *namespace {
                    return Err(ProofError::InvalidAbsenceLeaf);
                }
                vec![*leaf_hash]
            }
            None => leaves
                .iter()
                .map(|leaf| {
                    let digest = hasher.hash_leaf(leaf.as_ref())?;
                    if digest.min_namespace != *namespace {
                        return Err(ProofError::NamespaceMismatch {
                            expected: *namespace,
                            got: digest.min_namespace,
                        });
                    }
                    Ok(digest)
                })
                .collect::<Result<Vec<_>, _>>()?,
        };
        self.verify_leaf_hashes(&hasher, Some(namespace), leaf_hashes, root)
    }

    /// Verifies that `leaves`, without their namespace prefix, sit in `[start, end)` under `root`.
    pub fn verify_inclusion(
        &self,
        namespace: &NamespaceId,
        leaves: &[impl AsRef<[u8]>],
        root: &NamespacedDigest,
    ) -> Result<(), ProofError> {
        let hasher = self.hasher();
        let leaf_hashes = leaves
            .iter()
            .map(|leaf| hasher.hash_leaf(&[namespace.as_ref(), leaf.as_ref()].concat()))
            .collect::<Result<Vec<_>, _>>()?;
        self.verify_leaf_hashes(&hasher, None, leaf_hashes, root)
    }

    fn verify_leaf_hashes(
        &self,
        hasher: &NamespacedHasher,
        completeness: Option<&NamespaceId>,
        leaf_hashes: Vec<NamespacedDigest>,
        root: &NamespacedDigest,
    ) -> Result<(), ProofError> {
        if self.start >= self.end {
            return Err(ProofError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        if leaf_hashes.len() != self.end - self.start {
            return Err(ProofError::LeafCountMismatch {
                expected: self.end - self.start,
                got: leaf_hashes.len(),
            });
        }

        if let Some(namespace) = completeness {
            let mut leaf_index = 0;
            let mut left_subtrees = 0;
            while leaf_index != self.start && left_subtrees < self.nodes.len() {
                leaf_index += next_subtree_size(leaf_index, self.start);
                left_subtrees += 1;
            }
            let (left, right) = self.nodes.split_at(left_subtrees);
            if left.iter().any(|node| *namespace <= node.max_namespace)
                || right.iter().any(|node| node.min_namespace <= *namespace)
            {
                return Err(ProofError::Incomplete);
            }
        }

        let mut leaves = leaf_hashes.into_iter();
        let mut nodes = self.nodes.as_slice();
        let estimate = match self.end {
            0 | 1 => 1,
            end => split_point(end) * 2,
        };
        let mut computed = self
            .compute_root(hasher, 0, estimate, &mut leaves, &mut nodes)?
            .ok_or(ProofError::MissingNodes)?;
        for node in nodes {
            computed = hasher.hash_node(&computed, node)?;
        }
        if computed == *root {
            Ok(())
        } else {
            Err(ProofError::RootMismatch)
        }
    }

    fn compute_root(
        &self,
        hasher: &NamespacedHasher,
        start: usize,
        end: usize,
        leaves: &mut impl Iterator<Item = NamespacedDigest>,
        nodes: &mut &[NamespacedDigest],
    ) -> Result<Option<NamespacedDigest>, ProofError> {
        if end - start == 1 && self.start <= start && start < self.end {
            return Ok(leaves.next());
        }
        if end - start == 1 || end <= self.start || start >= self.end {
            return Ok(pop_front(nodes));
        }
        let k = split_point(end - start);
        let left = self.compute_root(hasher, start, start + k, leaves, nodes)?;
        let right = self.compute_root(hasher, start + k, end, leaves, nodes)?;
        match (left, right) {
            (Some(left), Some(right)) => Ok(Some(hasher.hash_node(&left, &right)?)),
            (left, None) => Ok(left),
            (None, Some(_)) => Err(ProofError::MissingNodes),
        }
    }
}

fn pop_front(nodes: &mut &[NamespacedDigest]) -> Option<NamespacedDigest> {
    let (first, rest) = nodes.split_first()?;
    *nodes = rest;
    Some(*first)
}

/// Size of the largest subtree starting at `start` that fits before `end`.
fn next_subtree_size(start: usize, end: usize) -> usize {
    let ideal = if start == 0 {
        usize::BITS
    } else {
        start.trailing_zeros()
    };
    let max = usize::BITS - (end - start).leading_zeros() - 1;
    1 << ideal.min(max)
}
