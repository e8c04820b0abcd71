// crates
use serde::{Deserialize, Serialize};
use tessera_nmt::simple_merkle::{hash_from_byte_slices, Hash};
// internal
use crate::root::{Root, RootError};

pub type HeaderHash = Hash;

/// Block header extended with the data availability root of the block's square.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedHeader {
    pub height: u64,
    /// Unix time in seconds.
    pub time: u64,
    #[serde(with = "tessera_utils::serde::hex_array")]
    pub last_header_hash: HeaderHash,
    pub dah: Root,
}

impl ExtendedHeader {
    pub fn new(height: u64, time: u64, last_header_hash: HeaderHash, dah: Root) -> Self {
        Self {
            height,
            time,
            last_header_hash,
            dah,
        }
    }

    pub fn hash(&self) -> HeaderHash {
        hash_from_byte_slices(&[
            self.height.to_be_bytes().as_slice(),
            self.time.to_be_bytes().as_slice(),
            self.last_header_hash.as_slice(),
            self.dah.hash().as_slice(),
        ])
    }

    pub fn validate_basic(&self) -> Result<(), RootError> {
        self.dah.validate_basic()
    }
}
