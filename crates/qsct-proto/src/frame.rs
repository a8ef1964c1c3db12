//! Complete frames: header plus payload.

use bytes::{BufMut, Bytes};

use crate::{
    errors::{ProtocolError, Result},
    header::FrameHeader,
};

/// One unit of transmission.
///
/// Construction goes through [`Frame::new`], [`Frame::decode`], or the
/// stream decoder, all of which keep `header.payload_len() == payload.len()`.
/// The fields are read-only from outside the crate so the two cannot drift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub(crate) header: FrameHeader,
    pub(crate) payload: Bytes,
}

impl Frame {
    /// Frame carrying `payload`.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        let header = FrameHeader::for_payload(&payload);
        Self { header, payload }
    }

    /// Length header.
    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// Opaque payload bytes.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Consume the frame, keeping only its payload.
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Total encoded size (header + payload).
    pub fn encoded_len(&self) -> usize {
        FrameHeader::SIZE + self.payload.len()
    }

    /// Append the wire representation to `dst`.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_slice(&self.header.to_bytes());
        dst.put_slice(&self.payload);
    }

    /// Wire representation as a fresh buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        Bytes::from(buf)
    }

    /// Decode one frame occupying all of `bytes`.
    ///
    /// Use [`crate::FrameDecoder`] for streams; this is for buffers that are
    /// already known to hold exactly one frame (datagrams, fuzz inputs).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let header = *FrameHeader::from_bytes(bytes)?;
        let body = &bytes[FrameHeader::SIZE..];
        let declared = header.payload_len();

        if declared != body.len() as u64 {
            return Err(ProtocolError::LengthMismatch { declared, actual: body.len() as u64 });
        }

        Ok(Self { header, payload: Bytes::copy_from_slice(body) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_wire_bytes() {
        let frame = Frame::new(&b"hello"[..]);
        insta::assert_snapshot!(hex::encode(frame.to_bytes()), @"000000000000000568656c6c6f");
    }

    #[test]
    fn empty_frame_is_header_only() {
        let frame = Frame::new(Bytes::new());
        assert_eq!(frame.encoded_len(), 8);
        insta::assert_snapshot!(hex::encode(frame.to_bytes()), @"0000000000000000");
    }

    #[test]
    fn decode_roundtrip() {
        let frame = Frame::new(vec![7u8; 300]);
        let decoded = Frame::decode(&frame.to_bytes()).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn accessors_agree_with_header() {
        let frame = Frame::new(vec![3u8; 42]);
        assert_eq!(frame.header().payload_len(), 42);
        assert_eq!(frame.payload().len(), 42);
        assert_eq!(frame.into_payload(), Bytes::from(vec![3u8; 42]));
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let mut wire = Frame::new(&b"abc"[..]).to_bytes().to_vec();
        wire.push(0xff);
        assert_eq!(
            Frame::decode(&wire),
            Err(ProtocolError::LengthMismatch { declared: 3, actual: 4 })
        );
    }

    #[test]
    fn decode_rejects_missing_payload() {
        let wire = FrameHeader::new(10).to_bytes();
        assert_eq!(
            Frame::decode(&wire),
            Err(ProtocolError::LengthMismatch { declared: 10, actual: 0 })
        );
    }
}
