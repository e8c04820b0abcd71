// std
use std::fmt::{Debug, Formatter};
// crates
use serde::{Deserialize, Serialize};
use tessera_nmt::simple_merkle::{hash_from_byte_slices, Hash};
use tessera_nmt::NamespacedDigest;
use tessera_utils::math::is_power_of_two;
// internal
use crate::eds::{Axis, EdsError, ExtendedDataSquare};
use crate::namespace::Namespace;

pub const MIN_EXTENDED_SQUARE_WIDTH: usize = 2;
pub const MAX_EXTENDED_SQUARE_WIDTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RootError {
    #[error("{rows} row roots and {columns} column roots")]
    Mismatch { rows: usize, columns: usize },
    #[error("width {0} is not a power of two")]
    NotPowerOfTwo(usize),
    #[error("width {0} is outside [{MIN_EXTENDED_SQUARE_WIDTH}, {MAX_EXTENDED_SQUARE_WIDTH}]")]
    OutOfRange(usize),
}

/// Data availability header: the row and column roots of an extended data square.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Root {
    row_roots: Vec<NamespacedDigest>,
    column_roots: Vec<NamespacedDigest>,
}

pub type DataAvailabilityHeader = Root;

impl Root {
    pub fn new(row_roots: Vec<NamespacedDigest>, column_roots: Vec<NamespacedDigest>) -> Self {
        Self {
            row_roots,
            column_roots,
        }
    }

    pub fn from_eds(eds: &ExtendedDataSquare) -> Result<Self, EdsError> {
        Ok(Self::new(eds.row_roots()?, eds.column_roots()?))
    }

    pub fn validate_basic(&self) -> Result<(), RootError> {
        let (rows, columns) = (self.row_roots.len(), self.column_roots.len());
        if rows != columns {
            return Err(RootError::Mismatch { rows, columns });
        }
        if !(MIN_EXTENDED_SQUARE_WIDTH..=MAX_EXTENDED_SQUARE_WIDTH).contains(&rows) {
            return Err(RootError::OutOfRange(rows));
        }
        if !is_power_of_two(rows) {
            return Err(RootError::NotPowerOfTwo(rows));
        }
        Ok(())
    }

    pub fn row_roots(&self) -> &[NamespacedDigest] {
        &self.row_roots
    }

    pub fn column_roots(&self) -> &[NamespacedDigest] {
        &self.column_roots
    }

    /// Width of the extended square.
    pub fn width(&self) -> usize {
        self.row_roots.len()
    }

    pub fn axis_root(&self, axis: Axis, index: usize) -> Option<&NamespacedDigest> {
        match axis {
            Axis::Row => self.row_roots.get(index),
            Axis::Col => self.column_roots.get(index),
        }
    }

    /// Indexes of the rows whose namespace range covers `namespace`.
    pub fn rows_with_namespace<'a>(
        &'a self,
        namespace: &'a Namespace,
    ) -> impl Iterator<Item = usize> + 'a {
        self.row_roots
            .iter()
            .enumerate()
            .filter(move |(_, root)| root.contains(namespace))
            .map(|(index, _)| index)
    }

    /// Merkle root over the row roots followed by the column roots.
    pub fn hash(&self) -> Hash {
        let leaves: Vec<_> = self
            .row_roots
            .iter()
            .chain(&self.column_roots)
            .map(NamespacedDigest::to_array)
            .collect();
        hash_from_byte_slices(&leaves)
    }

    pub fn hash_hex(&self) -> String {
        const_hex::encode(self.hash())
    }
}

impl Debug for Root {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Root")
            .field("width", &self.width())
            .field("hash", &self.hash_hex())
            .finish()
    }
}
