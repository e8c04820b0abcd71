//! Content addressing of namespaced Merkle tree nodes.
//!
//! A node is addressed by a CIDv1 with the [`NMT_CODEC`] codec whose multihash wraps the
//! node's namespaced digest under [`SHA256_NAMESPACE8_FLAGGED`]. The multihash scheme and the
//! codec live in a process wide registry seeded once on first use.

// std
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
// crates
use cid::Cid;
use multihash::Multihash;
use once_cell::sync::Lazy;
use tracing::error;
// internal
use crate::hasher::{NamespacedDigest, NamespacedHasher, NAMESPACED_HASH_SIZE};
use crate::node::hash_encoded_node;
use crate::NmtError;

/// Codec of leaf and inner nodes of a namespaced Merkle tree.
pub const NMT_CODEC: u64 = 0x7700;
pub const NMT_CODEC_NAME: &str = "nmt-node";

/// Multihash code of the flagged namespaced sha256 over an encoded node.
pub const SHA256_NAMESPACE8_FLAGGED: u64 = 0x7701;
pub const SHA256_NAMESPACE8_FLAGGED_NAME: &str = "sha2-256-namespace8-flagged";

/// Bytes in front of the digest in an encoded multihash: varint code (3) and varint size (1).
pub const MULTIHASH_OVERHEAD: usize = 4;

pub type NmtMultihash = Multihash<64>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("invalid digest length {got}, expected {expected}")]
    InvalidDigestLength { expected: usize, got: usize },
    #[error("unsupported multihash code {0:#x}")]
    UnsupportedMultihash(u64),
    #[error("unsupported codec {0:#x}")]
    UnsupportedCodec(u64),
    #[error("multihash: {0}")]
    Multihash(String),
    #[error(transparent)]
    Node(#[from] NmtError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("code {code:#x} is already registered as {existing}, refusing {requested}")]
    Conflict {
        code: u64,
        existing: String,
        requested: String,
    },
}

/// A multihash function that can be registered under a code.
#[derive(Clone, Copy, Debug)]
pub struct HashScheme {
    pub code: u64,
    pub name: &'static str,
    pub digest_size: usize,
    pub hash: fn(&[u8]) -> Result<Vec<u8>, NmtError>,
}

impl HashScheme {
    fn same_as(&self, other: &Self) -> bool {
        self.code == other.code && self.name == other.name && self.digest_size == other.digest_size
    }
}

fn nmt_node_hash(encoded: &[u8]) -> Result<Vec<u8>, NmtError> {
    hash_encoded_node(&NamespacedHasher::with_ignore_max_namespace(true), encoded)
        .map(|digest| digest.to_array().to_vec())
}

pub const NMT_HASH_SCHEME: HashScheme = HashScheme {
    code: SHA256_NAMESPACE8_FLAGGED,
    name: SHA256_NAMESPACE8_FLAGGED_NAME,
    digest_size: NAMESPACED_HASH_SIZE,
    hash: nmt_node_hash,
};

#[derive(Default)]
struct Registry {
    hashes: HashMap<u64, HashScheme>,
    codecs: HashMap<u64, &'static str>,
}

static REGISTRY: Lazy<RwLock<Registry>> = Lazy::new(|| {
    let mut registry = Registry::default();
    registry
        .hashes
        .insert(NMT_HASH_SCHEME.code, NMT_HASH_SCHEME);
    registry.codecs.insert(NMT_CODEC, NMT_CODEC_NAME);
    RwLock::new(registry)
});

/// Registers a hash scheme. Registering an identical scheme again is a no-op.
pub fn register_hash(scheme: HashScheme) -> Result<(), RegistryError> {
    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    match registry.hashes.get(&scheme.code) {
        Some(existing) if existing.same_as(&scheme) => Ok(()),
        Some(existing) => Err(RegistryError::Conflict {
            code: scheme.code,
            existing: existing.name.to_string(),
            requested: scheme.name.to_string(),
        }),
        None => {
            registry.hashes.insert(scheme.code, scheme);
            Ok(())
        }
    }
}

pub fn register_codec(code: u64, name: &'static str) -> Result<(), RegistryError> {
    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    match registry.codecs.get(&code) {
        Some(existing) if *existing == name => Ok(()),
        Some(existing) => Err(RegistryError::Conflict {
            code,
            existing: existing.to_string(),
            requested: name.to_string(),
        }),
        None => {
            registry.codecs.insert(code, name);
            Ok(())
        }
    }
}

/// Registers a hash scheme at startup, a conflicting registration is a configuration bug.
pub fn must_register_hash(scheme: HashScheme) {
    if let Err(e) = register_hash(scheme) {
        error!("Hash registration failed: {e}");
        panic!("{e}");
    }
}

pub fn must_register_codec(code: u64, name: &'static str) {
    if let Err(e) = register_codec(code, name) {
        error!("Codec registration failed: {e}");
        panic!("{e}");
    }
}

pub fn hash_scheme(code: u64) -> Option<HashScheme> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .hashes
        .get(&code)
        .copied()
}

pub fn codec_name(code: u64) -> Option<&'static str> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .codecs
        .get(&code)
        .copied()
}

/// Hashes `data` with the scheme registered under `code`.
pub fn multihash_digest(code: u64, data: &[u8]) -> Result<NmtMultihash, AddressError> {
    let scheme = hash_scheme(code).ok_or(AddressError::UnsupportedMultihash(code))?;
    let digest = (scheme.hash)(data)?;
    NmtMultihash::wrap(code, &digest).map_err(|e| AddressError::Multihash(e.to_string()))
}

/// Content identifier of a node given its raw digest.
pub fn digest_to_cid(digest: &[u8]) -> Result<Cid, AddressError> {
    if digest.len() != NAMESPACED_HASH_SIZE {
        return Err(AddressError::InvalidDigestLength {
            expected: NAMESPACED_HASH_SIZE,
            got: digest.len(),
        });
    }
    let multihash = NmtMultihash::wrap(SHA256_NAMESPACE8_FLAGGED, digest)
        .map_err(|e| AddressError::Multihash(e.to_string()))?;
    Ok(Cid::new_v1(NMT_CODEC, multihash))
}

pub fn cid_from_digest(digest: &NamespacedDigest) -> Result<Cid, AddressError> {
    digest_to_cid(&digest.to_array())
}

/// Raw digest of a node address, the encoded multihash without its header.
pub fn cid_to_digest(cid: &Cid) -> Result<Vec<u8>, AddressError> {
    if cid.codec() != NMT_CODEC {
        return Err(AddressError::UnsupportedCodec(cid.codec()));
    }
    let multihash = cid.hash();
    if multihash.code() != SHA256_NAMESPACE8_FLAGGED {
        return Err(AddressError::UnsupportedMultihash(multihash.code()));
    }
    let bytes = multihash.to_bytes();
    let digest = bytes
        .get(MULTIHASH_OVERHEAD..)
        .unwrap_or_default()
        .to_vec();
    if digest.len() != NAMESPACED_HASH_SIZE {
        return Err(AddressError::InvalidDigestLength {
            expected: NAMESPACED_HASH_SIZE,
            got: digest.len(),
        });
    }
    Ok(digest)
}

pub fn cid_to_namespaced_digest(cid: &Cid) -> Result<NamespacedDigest, AddressError> {
    Ok(NamespacedDigest::from_bytes(&cid_to_digest(cid)?)?)
}

/// Address of an encoded node, hashing it through the registered scheme.
pub fn cid_of_encoded_node(encoded: &[u8]) -> Result<Cid, AddressError> {
    let multihash = multihash_digest(SHA256_NAMESPACE8_FLAGGED, encoded)?;
    Ok(Cid::new_v1(NMT_CODEC, multihash))
}
