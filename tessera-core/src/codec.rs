// crates
use reed_solomon_erasure::galois_8::ReedSolomon;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("too many chunks: {0}")]
    TooManyChunks(usize),
    #[error("uneven chunks")]
    UnevenChunks,
    #[error("erasure coding failed: {0}")]
    Erasure(String),
}

impl From<reed_solomon_erasure::Error> for CodecError {
    fn from(e: reed_solomon_erasure::Error) -> Self {
        Self::Erasure(e.to_string())
    }
}

/// Erasure code applied to every row and column of a data square.
pub trait Codec: Send + Sync {
    /// Parity chunks for `data`, as many as there are data chunks.
    fn encode(&self, data: &[&[u8]]) -> Result<Vec<Vec<u8>>, CodecError>;

    /// Fills the missing chunks of a full axis (data followed by parity) in place.
    fn decode(&self, chunks: &mut [Option<Vec<u8>>]) -> Result<(), CodecError>;

    /// Maximum amount of data chunks per axis.
    fn max_chunks(&self) -> usize;
}

/// Reed Solomon over GF(2^8), one parity chunk per data chunk.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReedSolomonCodec;

impl ReedSolomonCodec {
    const MAX_CHUNKS: usize = 128;
}

impl Codec for ReedSolomonCodec {
    fn encode(&self, data: &[&[u8]]) -> Result<Vec<Vec<u8>>, CodecError> {
        let k = data.len();
        if k > Self::MAX_CHUNKS {
            return Err(CodecError::TooManyChunks(k));
        }
        let chunk_size = data.first().map(|chunk| chunk.len()).unwrap_or_default();
        if data.iter().any(|chunk| chunk.len() != chunk_size) {
            return Err(CodecError::UnevenChunks);
        }
        let mut shards: Vec<Vec<u8>> = data
            .iter()
            .map(|chunk| chunk.to_vec())
            .chain(std::iter::repeat(vec![0u8; chunk_size]).take(k))
            .collect();
        let encoder = ReedSolomon::new(k, k)?;
        encoder.encode(&mut shards)?;
        Ok(shards.split_off(k))
    }

    fn decode(&self, chunks: &mut [Option<Vec<u8>>]) -> Result<(), CodecError> {
        let k = chunks.len() / 2;
        if k > Self::MAX_CHUNKS {
            return Err(CodecError::TooManyChunks(k));
        }
        let decoder = ReedSolomon::new(k, k)?;
        decoder.reconstruct(chunks)?;
        Ok(())
    }

    fn max_chunks(&self) -> usize {
        Self::MAX_CHUNKS
    }
}
