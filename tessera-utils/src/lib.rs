pub mod math;

#[cfg(feature = "serde")]
pub mod serde {
    /// Fixed size digests. Hex for human readable formats, raw bytes otherwise.
    pub mod hex_array {
        use std::borrow::Cow;

        use serde::de::{Error, SeqAccess, Visitor};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<const N: usize, S: Serializer>(
            src: &[u8; N],
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            super::hex_bytes::serialize(src, serializer)
        }

        pub fn deserialize<'de, const N: usize, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<[u8; N], D::Error> {
            if deserializer.is_human_readable() {
                let s: Cow<str> = Cow::deserialize(deserializer)?;
                let mut output = [0u8; N];
                const_hex::decode_to_slice(s.as_ref(), &mut output).map_err(D::Error::custom)?;
                Ok(output)
            } else {
                deserializer.deserialize_bytes(Digest::<N>)
            }
        }

        struct Digest<const N: usize>;

        impl<'de, const N: usize> Visitor<'de> for Digest<N> {
            type Value = [u8; N];

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "a {N} byte digest")
            }

            fn visit_bytes<E: Error>(self, bytes: &[u8]) -> Result<Self::Value, E> {
                bytes
                    .try_into()
                    .map_err(|_| E::invalid_length(bytes.len(), &self))
            }

            // bincode hands fixed size bytes over as a sequence
            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut output = [0u8; N];
                for (read, byte) in output.iter_mut().enumerate() {
                    *byte = seq
                        .next_element()?
                        .ok_or_else(|| A::Error::invalid_length(read, &self))?;
                }
                Ok(output)
            }
        }
    }

    /// Hex for human readable formats, raw bytes otherwise. Use with `#[serde(with = ...)]`.
    pub mod hex_bytes {
        use std::borrow::Cow;

        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        pub fn serialize<S: Serializer>(src: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
            if serializer.is_human_readable() {
                const_hex::encode(src).serialize(serializer)
            } else {
                serializer.serialize_bytes(src)
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
            if deserializer.is_human_readable() {
                let s: Cow<str> = Cow::deserialize(deserializer)?;
                const_hex::decode(s.as_ref()).map_err(serde::de::Error::custom)
            } else {
                <Vec<u8>>::deserialize(deserializer)
            }
        }
    }

}
