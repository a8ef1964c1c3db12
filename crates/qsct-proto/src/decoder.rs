//! Incremental frame decoder.
//!
//! [`FrameDecoder`] is a pure state machine. It owns no stream; callers ask
//! [`FrameDecoder::wants`] how many bytes to read next, read at most that
//! many, and pass whatever arrived to [`FrameDecoder::feed`]. Any number of
//! short reads is fine, including one byte at a time.
//!
//! # State Machine
//!
//! ```text
//! ┌────────────────┐ 8 bytes  ┌──────────────────┐ remaining == 0 ┌──────────┐
//! │ AwaitingHeader │─────────>│ AwaitingPayload  │───────────────>│ Complete │
//! └────────────────┘          └──────────────────┘                └──────────┘
//!         │  │ length == 0                                             ▲  │
//!         │  └─────────────────────────────────────────────────────────┘  │
//!         │ length > limit    ┌──────────────────┐ remaining == 0         │
//!         └──────────────────>│    Discarding    │────────────────────────┘
//!                             └──────────────────┘
//! ```
//!
//! `Complete` holds either a frame or a [`ProtocolError::PayloadTooLarge`].
//! [`FrameDecoder::take`] hands it out and rearms the decoder for the next
//! header. Oversized payloads are read and dropped rather than buffered, so
//! the stream stays aligned on frame boundaries after the error.

use bytes::BytesMut;
use zerocopy::IntoBytes;

use crate::{
    DEFAULT_MAX_PAYLOAD_SIZE, DEFAULT_READ_CHUNK_SIZE,
    errors::{ProtocolError, Result},
    frame::Frame,
    header::FrameHeader,
};

/// Upper bound on the buffer reserved up front for a payload.
///
/// Larger payloads grow the buffer as bytes actually arrive, so a peer cannot
/// make us allocate by merely announcing a length.
const INITIAL_PAYLOAD_CAPACITY: usize = 64 * 1024;

/// Where the decoder is within the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    /// Accumulating the 8-byte header.
    AwaitingHeader {
        /// Header bytes received so far (0..8).
        received: usize,
    },
    /// Accumulating payload bytes.
    AwaitingPayload {
        /// Declared payload length.
        expected: u64,
        /// Bytes still to read.
        remaining: u64,
    },
    /// Dropping the payload of a frame that exceeds the size limit.
    Discarding {
        /// Declared payload length.
        declared: u64,
        /// Bytes still to drop.
        remaining: u64,
    },
    /// A result is ready for [`FrameDecoder::take`].
    Complete,
}

/// What end-of-stream means at the decoder's current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// Stream ended on a frame boundary.
    Clean,
    /// Stream ended inside a header.
    MidHeader {
        /// Header bytes that did arrive.
        received: usize,
    },
    /// Stream ended inside a payload.
    MidPayload {
        /// Declared payload length.
        expected: u64,
        /// Payload bytes that did arrive.
        received: u64,
    },
}

/// Sans-IO decoder for length-prefixed frames.
#[derive(Debug)]
pub struct FrameDecoder {
    state: DecodeState,
    header: FrameHeader,
    payload: BytesMut,
    ready: Option<Result<Frame>>,
    max_payload_size: u64,
    read_chunk_size: usize,
}

impl FrameDecoder {
    /// Decoder enforcing `max_payload_size` and asking for at most
    /// `read_chunk_size` payload bytes per read.
    ///
    /// A chunk size of zero is treated as one.
    pub fn new(max_payload_size: u64, read_chunk_size: usize) -> Self {
        Self {
            state: DecodeState::AwaitingHeader { received: 0 },
            header: FrameHeader::new(0),
            payload: BytesMut::new(),
            ready: None,
            max_payload_size,
            read_chunk_size: read_chunk_size.max(1),
        }
    }

    /// Current state.
    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Number of bytes to request from the stream next.
    ///
    /// Never more than the remainder of the current header or payload, and
    /// never more than the read chunk size while in a payload. Returns zero
    /// once a result is waiting in [`FrameDecoder::take`].
    pub fn wants(&self) -> usize {
        match self.state {
            DecodeState::AwaitingHeader { received } => FrameHeader::SIZE - received,
            DecodeState::AwaitingPayload { remaining, .. }
            | DecodeState::Discarding { remaining, .. } => {
                clamp_to(remaining, self.read_chunk_size)
            },
            DecodeState::Complete => 0,
        }
    }

    /// Consume bytes from `data`, returning how many were used.
    ///
    /// Stops early once a frame completes; the unconsumed tail belongs to the
    /// next frame and should be fed again after [`FrameDecoder::take`].
    pub fn feed(&mut self, data: &[u8]) -> usize {
        let mut rest = data;

        while !rest.is_empty() {
            match self.state {
                DecodeState::AwaitingHeader { received } => {
                    let n = (FrameHeader::SIZE - received).min(rest.len());
                    self.header.as_mut_bytes()[received..received + n]
                        .copy_from_slice(&rest[..n]);
                    rest = &rest[n..];

                    let received = received + n;
                    if received == FrameHeader::SIZE {
                        self.on_header();
                    } else {
                        self.state = DecodeState::AwaitingHeader { received };
                    }
                },
                DecodeState::AwaitingPayload { expected, remaining } => {
                    let n = clamp_to(remaining, rest.len());
                    self.payload.extend_from_slice(&rest[..n]);
                    rest = &rest[n..];

                    let remaining = remaining - n as u64;
                    if remaining == 0 {
                        let payload = self.payload.split().freeze();
                        self.complete(Ok(Frame { header: self.header, payload }));
                    } else {
                        self.state = DecodeState::AwaitingPayload { expected, remaining };
                    }
                },
                DecodeState::Discarding { declared, remaining } => {
                    let n = clamp_to(remaining, rest.len());
                    rest = &rest[n..];

                    let remaining = remaining - n as u64;
                    if remaining == 0 {
                        self.complete(Err(ProtocolError::PayloadTooLarge {
                            size: declared,
                            limit: self.max_payload_size,
                        }));
                    } else {
                        self.state = DecodeState::Discarding { declared, remaining };
                    }
                },
                DecodeState::Complete => break,
            }
        }

        data.len() - rest.len()
    }

    /// Take the completed frame (or size error), rearming for the next one.
    pub fn take(&mut self) -> Option<Result<Frame>> {
        let ready = self.ready.take()?;
        self.state = DecodeState::AwaitingHeader { received: 0 };
        Some(ready)
    }

    /// Classify an end-of-stream observed at the current position.
    pub fn stream_end(&self) -> StreamEnd {
        match self.state {
            DecodeState::AwaitingHeader { received: 0 } | DecodeState::Complete => StreamEnd::Clean,
            DecodeState::AwaitingHeader { received } => StreamEnd::MidHeader { received },
            DecodeState::AwaitingPayload { expected, remaining } => {
                StreamEnd::MidPayload { expected, received: expected - remaining }
            },
            DecodeState::Discarding { declared, remaining } => {
                StreamEnd::MidPayload { expected: declared, received: declared - remaining }
            },
        }
    }

    fn on_header(&mut self) {
        let length = self.header.payload_len();

        if length > self.max_payload_size {
            self.state = DecodeState::Discarding { declared: length, remaining: length };
        } else if length == 0 {
            self.complete(Ok(Frame { header: self.header, payload: bytes::Bytes::new() }));
        } else {
            self.payload.reserve(clamp_to(length, INITIAL_PAYLOAD_CAPACITY));
            self.state = DecodeState::AwaitingPayload { expected: length, remaining: length };
        }
    }

    fn complete(&mut self, result: Result<Frame>) {
        self.ready = Some(result);
        self.state = DecodeState::Complete;
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAYLOAD_SIZE, DEFAULT_READ_CHUNK_SIZE)
    }
}

/// `min(value, cap)` without truncating `value` on 32-bit targets.
fn clamp_to(value: u64, cap: usize) -> usize {
    usize::try_from(value).map_or(cap, |v| v.min(cap))
}
