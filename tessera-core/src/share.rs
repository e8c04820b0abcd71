// std
use std::fmt::{Debug, Formatter};
// crates
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
// internal
use crate::namespace::{
    Namespace, NAMESPACE_SIZE, RESERVED_PADDING_NAMESPACE, TAIL_PADDING_NAMESPACE,
};

pub const SHARE_SIZE: usize = 512;
pub const SHARE_INFO_BYTES: usize = 1;
pub const SEQUENCE_LEN_BYTES: usize = 4;
pub const FIRST_SPARSE_SHARE_CONTENT_SIZE: usize =
    SHARE_SIZE - NAMESPACE_SIZE - SHARE_INFO_BYTES - SEQUENCE_LEN_BYTES;
pub const CONTINUATION_SPARSE_SHARE_CONTENT_SIZE: usize =
    SHARE_SIZE - NAMESPACE_SIZE - SHARE_INFO_BYTES;

pub const SHARE_VERSION_ZERO: u8 = 0;
pub const MAX_SHARE_VERSION: u8 = 127;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShareError {
    #[error("invalid share encoding: {0}")]
    InvalidShareEncoding(String),
    #[error("unsupported share version {0}")]
    UnsupportedShareVersion(u8),
    #[error("data of {0} bytes does not fit a sequence")]
    DataTooLarge(usize),
}

/// First byte after the namespace: `version << 1 | sequence_start`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InfoByte(u8);

impl InfoByte {
    pub fn new(version: u8, is_sequence_start: bool) -> Result<Self, ShareError> {
        if version > MAX_SHARE_VERSION {
            return Err(ShareError::UnsupportedShareVersion(version));
        }
        Ok(Self(version << 1 | u8::from(is_sequence_start)))
    }

    pub fn version(&self) -> u8 {
        self.0 >> 1
    }

    pub fn is_sequence_start(&self) -> bool {
        self.0 & 1 == 1
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

/// Fixed size leaf of the data square: `namespace || info || [sequence length] || payload`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Bytes", into = "Bytes")]
pub struct Share(Bytes);

impl Share {
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Result<Self, ShareError> {
        let bytes = bytes.into();
        if bytes.len() != SHARE_SIZE {
            return Err(ShareError::InvalidShareEncoding(format!(
                "share of {} bytes, expected {SHARE_SIZE}",
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_bytes(&self) -> Bytes {
        self.0.clone()
    }

    pub fn namespace(&self) -> Namespace {
        let mut bytes = [0u8; NAMESPACE_SIZE];
        bytes.copy_from_slice(&self.0[..NAMESPACE_SIZE]);
        Namespace::new(bytes)
    }

    pub fn info(&self) -> InfoByte {
        InfoByte(self.0[NAMESPACE_SIZE])
    }

    pub fn is_sequence_start(&self) -> bool {
        self.info().is_sequence_start()
    }

    /// Declared length of the sequence this share starts.
    pub fn sequence_len(&self) -> Result<u32, ShareError> {
        if !self.is_sequence_start() {
            return Err(ShareError::InvalidShareEncoding(
                "sequence length requested from a continuation share".into(),
            ));
        }
        let start = NAMESPACE_SIZE + SHARE_INFO_BYTES;
        let len = self.0[start..start + SEQUENCE_LEN_BYTES]
            .try_into()
            .map(u32::from_be_bytes)
            .map_err(|_| ShareError::InvalidShareEncoding("truncated sequence length".into()))?;
        Ok(len)
    }

    pub fn payload(&self) -> &[u8] {
        let offset = NAMESPACE_SIZE
            + SHARE_INFO_BYTES
            + if self.is_sequence_start() {
                SEQUENCE_LEN_BYTES
            } else {
                0
            };
        &self.0[offset..]
    }

    /// Namespace padding: a sequence start declaring no data.
    pub fn is_namespace_padding(&self) -> bool {
        self.is_sequence_start() && matches!(self.sequence_len(), Ok(0))
    }

    pub fn is_tail_padding(&self) -> bool {
        self.namespace() == TAIL_PADDING_NAMESPACE
    }

    pub fn is_reserved_padding(&self) -> bool {
        self.namespace() == RESERVED_PADDING_NAMESPACE
    }

    pub fn is_padding(&self) -> bool {
        self.is_namespace_padding() || self.is_tail_padding() || self.is_reserved_padding()
    }

    pub fn namespace_padding(namespace: Namespace) -> Self {
        padding(namespace)
    }

    pub fn tail_padding() -> Self {
        padding(TAIL_PADDING_NAMESPACE)
    }

    pub fn reserved_padding() -> Self {
        padding(RESERVED_PADDING_NAMESPACE)
    }
}

fn padding(namespace: Namespace) -> Share {
    let mut buffer = BytesMut::with_capacity(SHARE_SIZE);
    buffer.put_slice(namespace.as_ref());
    buffer.put_u8(1);
    buffer.put_u32(0);
    buffer.resize(SHARE_SIZE, 0);
    Share(buffer.freeze())
}

impl TryFrom<Bytes> for Share {
    type Error = ShareError;

    fn try_from(bytes: Bytes) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl From<Share> for Bytes {
    fn from(share: Share) -> Self {
        share.0
    }
}

impl AsRef<[u8]> for Share {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for Share {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Share")
            .field("namespace", &self.namespace())
            .field("info", &self.info())
            .finish_non_exhaustive()
    }
}

/// Amount of shares a sequence of `length` bytes occupies.
pub fn sparse_shares_needed(length: u32) -> usize {
    let length = length as usize;
    if length == 0 {
        return 0;
    }
    if length <= FIRST_SPARSE_SHARE_CONTENT_SIZE {
        return 1;
    }
    let rest = length - FIRST_SPARSE_SHARE_CONTENT_SIZE;
    1 + rest.div_ceil(CONTINUATION_SPARSE_SHARE_CONTENT_SIZE)
}

/// Splits `data` into a sequence of shares of `namespace`.
pub fn split_blob(namespace: Namespace, data: &[u8], version: u8) -> Result<Vec<Share>, ShareError> {
    let declared = u32::try_from(data.len()).map_err(|_| ShareError::DataTooLarge(data.len()))?;
    let first_info = InfoByte::new(version, true)?;
    let continuation_info = InfoByte::new(version, false)?;
    let mut shares = Vec::with_capacity(sparse_shares_needed(declared));
    let (head, mut rest) = data.split_at(data.len().min(FIRST_SPARSE_SHARE_CONTENT_SIZE));
    if data.is_empty() {
        return Ok(shares);
    }

    let mut buffer = BytesMut::with_capacity(SHARE_SIZE);
    buffer.put_slice(namespace.as_ref());
    buffer.put_u8(first_info.as_u8());
    buffer.put_u32(declared);
    buffer.put_slice(head);
    buffer.resize(SHARE_SIZE, 0);
    shares.push(Share(buffer.freeze()));

    while !rest.is_empty() {
        let (chunk, tail) = rest.split_at(rest.len().min(CONTINUATION_SPARSE_SHARE_CONTENT_SIZE));
        let mut buffer = BytesMut::with_capacity(SHARE_SIZE);
        buffer.put_slice(namespace.as_ref());
        buffer.put_u8(continuation_info.as_u8());
        buffer.put_slice(chunk);
        buffer.resize(SHARE_SIZE, 0);
        shares.push(Share(buffer.freeze()));
        rest = tail;
    }
    Ok(shares)
}

/// One decoded sequence of shares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub namespace: Namespace,
    pub share_version: u8,
    pub data: Vec<u8>,
}

/// Reads a single sequence spanning exactly `shares`.
pub fn parse_sequence(shares: &[Share]) -> Result<Sequence, ShareError> {
    let Some(first) = shares.first() else {
        return Err(ShareError::InvalidShareEncoding("empty sequence".into()));
    };
    let length = first.sequence_len()?;
    let needed = sparse_shares_needed(length);
    if needed != shares.len() {
        return Err(ShareError::InvalidShareEncoding(format!(
            "sequence of {length} bytes needs {needed} shares, got {}",
            shares.len()
        )));
    }
    let namespace = first.namespace();
    let share_version = first.info().version();
    let mut data = Vec::with_capacity(length as usize);
    for (i, share) in shares.iter().enumerate() {
        if i > 0 && share.is_sequence_start() {
            return Err(ShareError::InvalidShareEncoding(format!(
                "unexpected sequence start at share {i}"
            )));
        }
        if share.namespace() != namespace {
            return Err(ShareError::InvalidShareEncoding(format!(
                "share {i} of namespace {} in a sequence of {namespace}",
                share.namespace()
            )));
        }
        data.extend_from_slice(share.payload());
    }
    data.truncate(length as usize);
    Ok(Sequence {
        namespace,
        share_version,
        data,
    })
}

/// Reads every sequence in `shares`, skipping padding.
pub fn parse_sparse_shares(shares: &[Share]) -> Result<Vec<Sequence>, ShareError> {
    let mut sequences = Vec::new();
    let mut cursor = 0;
    while cursor < shares.len() {
        let share = &shares[cursor];
        if share.is_padding() {
            cursor += 1;
            continue;
        }
        let needed = sparse_shares_needed(share.sequence_len()?);
        let end = cursor + needed;
        if end > shares.len() {
            return Err(ShareError::InvalidShareEncoding(format!(
                "sequence at share {cursor} needs {needed} shares, only {} left",
                shares.len() - cursor
            )));
        }
        sequences.push(parse_sequence(&shares[cursor..end])?);
        cursor = end;
    }
    Ok(sequences)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::namespace::namespace_from_hex;

    fn namespace() -> Namespace {
        namespace_from_hex("0000000000001234").unwrap()
    }

    #[test]
    fn test_sparse_shares_needed() {
        assert_eq!(sparse_shares_needed(0), 0);
        assert_eq!(sparse_shares_needed(1), 1);
        assert_eq!(sparse_shares_needed(499), 1);
        assert_eq!(sparse_shares_needed(500), 2);
        assert_eq!(sparse_shares_needed(499 + 503), 2);
        assert_eq!(sparse_shares_needed(499 + 504), 3);
    }

    #[test]
    fn test_split_layout() {
        let data = vec![7u8; 600];
        let shares = split_blob(namespace(), &data, SHARE_VERSION_ZERO).unwrap();
        assert_eq!(shares.len(), 2);
        let first = &shares[0];
        assert_eq!(first.namespace(), namespace());
        assert!(first.is_sequence_start());
        assert_eq!(first.sequence_len().unwrap(), 600);
        assert_eq!(first.payload().len(), FIRST_SPARSE_SHARE_CONTENT_SIZE);
        assert!(!shares[1].is_sequence_start());
        assert_eq!(shares[1].payload().len(), CONTINUATION_SPARSE_SHARE_CONTENT_SIZE);
        assert!(shares[1].sequence_len().is_err());
        assert!(!first.is_padding());
    }

    #[test]
    fn test_split_parse_roundtrip() {
        for len in [1usize, 498, 499, 500, 1002, 1003, 5000] {
            let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let shares = split_blob(namespace(), &data, SHARE_VERSION_ZERO).unwrap();
            assert_eq!(shares.len(), sparse_shares_needed(len as u32));
            let sequence = parse_sequence(&shares).unwrap();
            assert_eq!(sequence.data, data);
            assert_eq!(sequence.namespace, namespace());
            assert_eq!(sequence.share_version, SHARE_VERSION_ZERO);
        }
    }

    #[test]
    fn test_padding_shares() {
        let padding = Share::namespace_padding(namespace());
        assert!(padding.is_namespace_padding());
        assert!(padding.is_padding());
        assert_eq!(padding.namespace(), namespace());
        assert!(Share::tail_padding().is_tail_padding());
        assert!(Share::reserved_padding().is_reserved_padding());
    }

    #[test]
    fn test_parse_skips_padding() {
        let mut shares = vec![Share::namespace_padding(namespace()); 3];
        shares.extend(split_blob(namespace(), b"first", 0).unwrap());
        shares.extend(split_blob(namespace(), &[1u8; 700], 0).unwrap());
        shares.push(Share::tail_padding());
        let sequences = parse_sparse_shares(&shares).unwrap();
        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences[0].data, b"first");
        assert_eq!(sequences[1].data, vec![1u8; 700]);
    }

    #[test]
    fn test_invalid_encodings() {
        assert!(matches!(
            Share::from_bytes(vec![0u8; 10]),
            Err(ShareError::InvalidShareEncoding(_))
        ));
        let shares = split_blob(namespace(), &[1u8; 700], 0).unwrap();
        assert!(parse_sequence(&shares[..1]).is_err());
        assert!(parse_sequence(&shares[1..]).is_err());
        assert!(parse_sparse_shares(&shares[..1]).is_err());
        assert_eq!(
            split_blob(namespace(), b"x", 200),
            Err(ShareError::UnsupportedShareVersion(200))
        );
    }

    #[test]
    fn test_share_serde() {
        let share = Share::tail_padding();
        let encoded = bincode::serialize(&share).unwrap();
        assert_eq!(bincode::deserialize::<Share>(&encoded).unwrap(), share);
    }
}
