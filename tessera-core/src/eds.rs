// crates
use serde::{Deserialize, Serialize};
use tessera_nmt::{NamespaceMerkleTree, NamespacedDigest, NamespacedHasher, NmtError};
use tessera_utils::math::{ceil_sqrt, is_power_of_two};
// internal
use crate::codec::{Codec, CodecError};
use crate::namespace::{Namespace, PARITY_SHARES_NAMESPACE};
use crate::share::{Share, ShareError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Row,
    Col,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EdsError {
    #[error("{0} shares do not form a square with a power of two width")]
    InvalidShareCount(usize),
    #[error("index ({row}, {col}) is outside a square of width {width}")]
    OutOfBounds { row: usize, col: usize, width: usize },
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Share(#[from] ShareError),
    #[error(transparent)]
    Nmt(#[from] NmtError),
}

/// Namespace under which the share at `share_index` of axis `axis_index` is committed.
///
/// Only shares of the original quadrant keep their own namespace, the rest is parity.
pub fn leaf_namespace(
    axis_index: usize,
    share_index: usize,
    original_width: usize,
    share: &Share,
) -> Namespace {
    if axis_index < original_width && share_index < original_width {
        share.namespace()
    } else {
        PARITY_SHARES_NAMESPACE
    }
}

/// Erasure coded square, twice as wide as the original one, stored row major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSquare")]
pub struct ExtendedDataSquare {
    width: usize,
    shares: Vec<Share>,
}

/// Decoded layout, checked before it becomes an [`ExtendedDataSquare`].
#[derive(Deserialize)]
struct RawSquare {
    width: usize,
    shares: Vec<Share>,
}

impl TryFrom<RawSquare> for ExtendedDataSquare {
    type Error = EdsError;

    fn try_from(RawSquare { width, shares }: RawSquare) -> Result<Self, Self::Error> {
        Self::from_shares(width, shares)
    }
}

impl ExtendedDataSquare {
    /// Extends the original square: rows into the right quadrant, columns into the bottom one
    /// and the bottom rows into the last quadrant.
    pub fn compute(original: Vec<Share>, codec: &dyn Codec) -> Result<Self, EdsError> {
        let k = ceil_sqrt(original.len());
        if k * k != original.len() || !is_power_of_two(k) {
            return Err(EdsError::InvalidShareCount(original.len()));
        }
        let width = 2 * k;
        let mut cells: Vec<Option<Share>> = vec![None; width * width];
        for (i, share) in original.into_iter().enumerate() {
            cells[(i / k) * width + i % k] = Some(share);
        }
        let take = |cells: &Vec<Option<Share>>, index: usize| -> Result<Share, EdsError> {
            cells[index]
                .clone()
                .ok_or(EdsError::InvalidShareCount(index))
        };

        for row in 0..k {
            let data = (0..k)
                .map(|col| take(&cells, row * width + col))
                .collect::<Result<Vec<_>, _>>()?;
            let parity = encode(codec, &data)?;
            for (offset, share) in parity.into_iter().enumerate() {
                cells[row * width + k + offset] = Some(share);
            }
        }
        for col in 0..k {
            let data = (0..k)
                .map(|row| take(&cells, row * width + col))
                .collect::<Result<Vec<_>, _>>()?;
            let parity = encode(codec, &data)?;
            for (offset, share) in parity.into_iter().enumerate() {
                cells[(k + offset) * width + col] = Some(share);
            }
        }
        for row in k..width {
            let data = (0..k)
                .map(|col| take(&cells, row * width + col))
                .collect::<Result<Vec<_>, _>>()?;
            let parity = encode(codec, &data)?;
            for (offset, share) in parity.into_iter().enumerate() {
                cells[row * width + k + offset] = Some(share);
            }
        }

        let shares = cells
            .into_iter()
            .enumerate()
            .map(|(index, share)| share.ok_or(EdsError::InvalidShareCount(index)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { width, shares })
    }

    /// Wraps an already extended square.
    pub fn from_shares(width: usize, shares: Vec<Share>) -> Result<Self, EdsError> {
        if width < 2 || !is_power_of_two(width) || width * width != shares.len() {
            return Err(EdsError::InvalidShareCount(shares.len()));
        }
        Ok(Self { width, shares })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn original_width(&self) -> usize {
        self.width / 2
    }

    pub fn shares(&self) -> &[Share] {
        &self.shares
    }

    pub fn share(&self, row: usize, col: usize) -> Result<&Share, EdsError> {
        if row >= self.width || col >= self.width {
            return Err(EdsError::OutOfBounds {
                row,
                col,
                width: self.width,
            });
        }
        Ok(&self.shares[row * self.width + col])
    }

    pub fn row(&self, index: usize) -> &[Share] {
        &self.shares[index * self.width..(index + 1) * self.width]
    }

    pub fn column(&self, index: usize) -> Vec<Share> {
        (0..self.width)
            .map(|row| self.shares[row * self.width + index].clone())
            .collect()
    }

    pub fn axis(&self, axis: Axis, index: usize) -> Vec<Share> {
        match axis {
            Axis::Row => self.row(index).to_vec(),
            Axis::Col => self.column(index),
        }
    }

    /// Shares of the original quadrant in row major order.
    pub fn original_shares(&self) -> Vec<Share> {
        let k = self.original_width();
        (0..k)
            .flat_map(|row| self.row(row)[..k].iter().cloned())
            .collect()
    }

    /// Namespaced Merkle tree of one row or column, leaves prefixed with their erasured namespace.
    pub fn axis_tree(&self, axis: Axis, index: usize) -> Result<NamespaceMerkleTree, EdsError> {
        let k = self.original_width();
        let mut tree = NamespaceMerkleTree::with_capacity(NamespacedHasher::default(), self.width);
        for (position, share) in self.axis(axis, index).iter().enumerate() {
            let namespace = leaf_namespace(index, position, k, share);
            tree.push([namespace.as_ref(), share.as_bytes()].concat())?;
        }
        Ok(tree)
    }

    pub fn row_roots(&self) -> Result<Vec<NamespacedDigest>, EdsError> {
        (0..self.width)
            .map(|row| Ok(self.axis_tree(Axis::Row, row)?.root()))
            .collect()
    }

    pub fn column_roots(&self) -> Result<Vec<NamespacedDigest>, EdsError> {
        (0..self.width)
            .map(|col| Ok(self.axis_tree(Axis::Col, col)?.root()))
            .collect()
    }

    /// Recomputes the missing shares of a partially known square, axis by axis, until done.
    pub fn repair(
        width: usize,
        mut cells: Vec<Option<Share>>,
        codec: &dyn Codec,
    ) -> Result<Self, EdsError> {
        if width < 2 || !is_power_of_two(width) || width * width != cells.len() {
            return Err(EdsError::InvalidShareCount(cells.len()));
        }
        let k = width / 2;
        loop {
            let missing = cells.iter().filter(|cell| cell.is_none()).count();
            if missing == 0 {
                break;
            }
            for axis in [Axis::Row, Axis::Col] {
                for index in 0..width {
                    let positions: Vec<usize> = (0..width)
                        .map(|i| match axis {
                            Axis::Row => index * width + i,
                            Axis::Col => i * width + index,
                        })
                        .collect();
                    let known = positions.iter().filter(|p| cells[**p].is_some()).count();
                    if known == width || known < k {
                        continue;
                    }
                    let mut chunks: Vec<Option<Vec<u8>>> = positions
                        .iter()
                        .map(|p| cells[*p].as_ref().map(|share| share.as_bytes().to_vec()))
                        .collect();
                    codec.decode(&mut chunks)?;
                    for (position, chunk) in positions.iter().zip(chunks) {
                        if cells[*position].is_none() {
                            let chunk = chunk.ok_or(EdsError::InvalidShareCount(*position))?;
                            cells[*position] = Some(Share::from_bytes(chunk)?);
                        }
                    }
                }
            }
            if cells.iter().filter(|cell| cell.is_none()).count() == missing {
                return Err(CodecError::Erasure("unrepairable square".into()).into());
            }
        }
        let shares = cells.into_iter().flatten().collect();
        Self::from_shares(width, shares)
    }
}

fn encode(codec: &dyn Codec, data: &[Share]) -> Result<Vec<Share>, EdsError> {
    let chunks: Vec<&[u8]> = data.iter().map(Share::as_bytes).collect();
    codec
        .encode(&chunks)?
        .into_iter()
        .map(|chunk| Share::from_bytes(chunk).map_err(EdsError::from))
        .collect()
}
