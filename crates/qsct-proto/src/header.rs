//! The fixed 8-byte frame header.

use zerocopy::{
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
    byteorder::{BigEndian, U64},
};

use crate::errors::{ProtocolError, Result};

/// Frame header: payload length as an unsigned 64-bit big-endian integer.
///
/// The layout is `#[repr(C)]` over an unaligned big-endian integer, so a
/// header can be viewed directly inside a receive buffer without copying.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned,
)]
#[repr(C)]
pub struct FrameHeader {
    length: U64<BigEndian>,
}

impl FrameHeader {
    /// Encoded size of a header on the wire.
    pub const SIZE: usize = 8;

    /// Header announcing a payload of `length` bytes.
    pub fn new(length: u64) -> Self {
        Self { length: U64::new(length) }
    }

    /// Header for a payload slice.
    pub fn for_payload(payload: &[u8]) -> Self {
        Self::new(payload.len() as u64)
    }

    /// View the leading [`FrameHeader::SIZE`] bytes of `bytes` as a header.
    ///
    /// Trailing bytes are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        Self::ref_from_prefix(bytes)
            .map(|(header, _rest)| header)
            .map_err(|_| ProtocolError::FrameTooShort { expected: Self::SIZE, actual: bytes.len() })
    }

    /// Payload length carried by this header.
    pub fn payload_len(&self) -> u64 {
        self.length.get()
    }

    /// Wire representation.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out.copy_from_slice(self.as_bytes());
        out
    }
}
