//! Serializer for persisted values and wire formats.
pub(crate) mod bincode;

// std
use std::io;
// crates
use ::bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;
// internal
use self::bincode::OPTIONS;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to serialize message: {0}")]
    Serialize(::bincode::Error),
    #[error("Failed to deserialize message: {0}")]
    Deserialize(::bincode::Error),
}

impl From<Error> for io::Error {
    fn from(value: Error) -> Self {
        io::Error::new(io::ErrorKind::InvalidData, value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub fn serialize<T: Serialize>(item: &T) -> Result<Vec<u8>> {
    (*OPTIONS).serialize(item).map_err(Error::Serialize)
}

pub fn deserialize<T: DeserializeOwned>(item: &[u8]) -> Result<T> {
    (*OPTIONS).deserialize(item).map_err(Error::Deserialize)
}
