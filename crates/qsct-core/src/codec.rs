//! Pluggable payload serialization.
//!
//! Frames carry opaque bytes; a [`PayloadCodec`] turns application values into
//! those bytes and back. [`CborCodec`] is the default because it is
//! self-describing and tolerant of added fields. [`BincodeCodec`] is a compact
//! alternative for peers that share exact type definitions.
//!
//! Neither codec can execute code on decode: a hostile payload can at worst
//! produce a [`CodecError::Decode`].

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Serialization failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Value could not be serialized.
    #[error("{codec} encode failed: {reason}")]
    Encode {
        /// Codec name.
        codec: &'static str,
        /// Underlying error message.
        reason: String,
    },

    /// Payload bytes could not be deserialized.
    #[error("{codec} decode failed: {reason}")]
    Decode {
        /// Codec name.
        codec: &'static str,
        /// Underlying error message.
        reason: String,
    },
}

/// Serializer/deserializer pair for frame payloads.
pub trait PayloadCodec: Send + Sync {
    /// Short name used in errors and logs.
    const NAME: &'static str;

    /// Serialize `value` into payload bytes.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    /// Deserialize payload bytes.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

/// CBOR via `ciborium`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CborCodec;

impl PayloadCodec for CborCodec {
    const NAME: &'static str = "cbor";

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        ciborium::ser::into_writer(value, &mut out)
            .map_err(|e| CodecError::Encode { codec: Self::NAME, reason: e.to_string() })?;
        Ok(out)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        ciborium::de::from_reader(bytes)
            .map_err(|e| CodecError::Decode { codec: Self::NAME, reason: e.to_string() })
    }
}

/// Bincode 1.x with its default (fixed-width, little-endian) options.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl PayloadCodec for BincodeCodec {
    const NAME: &'static str = "bincode";

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(value)
            .map_err(|e| CodecError::Encode { codec: Self::NAME, reason: e.to_string() })
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        bincode::deserialize(bytes)
            .map_err(|e| CodecError::Decode { codec: Self::NAME, reason: e.to_string() })
    }
}
