pub mod blob;
pub mod codec;
pub mod commitment;
pub mod eds;
pub mod getter;
pub mod header;
pub mod namespace;
pub mod root;
pub mod share;
pub mod square;
#[cfg(feature = "testutils")]
pub mod testutils;
pub mod wire;

pub use blob::Blob;
pub use commitment::Commitment;
pub use eds::{Axis, ExtendedDataSquare};
pub use header::ExtendedHeader;
pub use namespace::Namespace;
pub use root::{DataAvailabilityHeader, Root};
pub use share::Share;

pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;
