// crates
use tessera_utils::math::{ceil_sqrt, round_up_power_of_two};
use tracing::debug;
// internal
use crate::blob::Blob;
use crate::commitment::min_square_size;
use crate::share::{Share, ShareError};

/// Widest original square, extended squares are twice as wide.
pub const MAX_SQUARE_SIZE: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SquareError {
    #[error("{shares} shares need a square of width {width}, maximum is {MAX_SQUARE_SIZE}")]
    TooLarge { shares: usize, width: usize },
    #[error(transparent)]
    Share(#[from] ShareError),
}

/// Original (non extended) data square in row major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSquare {
    width: usize,
    shares: Vec<Share>,
}

impl DataSquare {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn shares(&self) -> &[Share] {
        &self.shares
    }

    pub fn into_shares(self) -> Vec<Share> {
        self.shares
    }
}

/// Lays blobs out in namespace order.
///
/// Every blob starts at a multiple of its own minimum square size; the gap is filled with
/// namespace padding of the previous blob and the square is completed with tail padding.
#[derive(Debug, Default, Clone)]
pub struct DataSquareBuilder {
    blobs: Vec<Blob>,
}

impl DataSquareBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blobs(blobs: impl IntoIterator<Item = Blob>) -> Self {
        Self {
            blobs: blobs.into_iter().collect(),
        }
    }

    pub fn push(&mut self, blob: Blob) -> &mut Self {
        self.blobs.push(blob);
        self
    }

    pub fn build(mut self) -> Result<DataSquare, SquareError> {
        self.blobs.sort_by_key(|blob| blob.namespace);
        let mut shares: Vec<Share> = Vec::new();
        let mut previous = None;
        for blob in &self.blobs {
            let blob_shares = blob.to_shares()?;
            let alignment = min_square_size(blob_shares.len());
            let start = shares.len().next_multiple_of(alignment);
            if let Some(namespace) = previous {
                shares.resize(start, Share::namespace_padding(namespace));
            }
            shares.extend(blob_shares);
            previous = Some(blob.namespace);
        }
        let width = round_up_power_of_two(ceil_sqrt(shares.len()));
        if width > MAX_SQUARE_SIZE {
            return Err(SquareError::TooLarge {
                shares: shares.len(),
                width,
            });
        }
        shares.resize(width * width, Share::tail_padding());
        debug!(width, blobs = self.blobs.len(), "Built data square");
        Ok(DataSquare { width, shares })
    }
}
