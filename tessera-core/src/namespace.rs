pub use tessera_nmt::{NamespaceId as Namespace, NAMESPACE_SIZE};

const fn reserved(last: u8) -> Namespace {
    let mut bytes = [0u8; NAMESPACE_SIZE];
    bytes[NAMESPACE_SIZE - 1] = last;
    Namespace::new(bytes)
}

pub const TX_NAMESPACE: Namespace = reserved(0x01);
pub const INTERMEDIATE_STATE_ROOTS_NAMESPACE: Namespace = reserved(0x02);
pub const EVIDENCE_NAMESPACE: Namespace = reserved(0x03);
pub const PAY_FOR_BLOB_NAMESPACE: Namespace = reserved(0x04);
/// Pads the reserved area of a square, also the upper bound of reserved namespaces.
pub const RESERVED_PADDING_NAMESPACE: Namespace = reserved(0xff);
pub const MAX_RESERVED_NAMESPACE: Namespace = RESERVED_PADDING_NAMESPACE;
pub const TAIL_PADDING_NAMESPACE: Namespace =
    Namespace::new([0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe]);
pub const PARITY_SHARES_NAMESPACE: Namespace = Namespace::MAX;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamespaceError {
    #[error("namespace {0} is reserved")]
    Reserved(Namespace),
    #[error("namespace {0} is used for padding or parity")]
    Padding(Namespace),
    #[error(transparent)]
    Malformed(#[from] tessera_nmt::NmtError),
}

pub fn is_reserved(namespace: &Namespace) -> bool {
    *namespace <= MAX_RESERVED_NAMESPACE
}

/// User blobs live strictly between the reserved namespaces and tail padding.
pub fn validate_blob_namespace(namespace: &Namespace) -> Result<(), NamespaceError> {
    if is_reserved(namespace) {
        return Err(NamespaceError::Reserved(*namespace));
    }
    if *namespace == TAIL_PADDING_NAMESPACE || *namespace == PARITY_SHARES_NAMESPACE {
        return Err(NamespaceError::Padding(*namespace));
    }
    Ok(())
}

/// Parses a namespace from its hex representation, as given in configuration or on the wire.
pub fn namespace_from_hex(value: &str) -> Result<Namespace, NamespaceError> {
    let bytes = const_hex::decode(value)
        .map_err(|e| tessera_nmt::NmtError::MalformedNode(format!("namespace hex: {e}")))?;
    Ok(Namespace::from_slice(&bytes)?)
}
