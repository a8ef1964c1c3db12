//! Framing error types.

use std::{io, time::Duration};

use qsct_proto::ProtocolError;
use thiserror::Error;

use crate::{channel::Direction, codec::CodecError};

/// Result alias for framing operations.
pub type Result<T> = std::result::Result<T, FrameError>;

/// Errors raised while sending or receiving frames.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The underlying stream failed. Passed through unmodified.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// Stream closed after part of a header arrived.
    #[error("connection closed after {received} of 8 header bytes")]
    ShortHeaderRead {
        /// Header bytes received before the close.
        received: usize,
    },

    /// Stream closed after part of a payload arrived.
    #[error("connection closed after {received} of {expected} payload bytes")]
    TruncatedPayload {
        /// Declared payload length.
        expected: u64,
        /// Payload bytes received before the close.
        received: u64,
    },

    /// Wire-format violation, including oversized payloads.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Payload could not be encoded or decoded. The frame itself was fully
    /// consumed, so the stream is still aligned.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A timed lock acquisition expired.
    #[error("timed out after {waited:?} waiting for the {direction} lock")]
    LockTimeout {
        /// Which lock was contended.
        direction: Direction,
        /// How long the caller waited.
        waited: Duration,
    },
}

impl FrameError {
    /// True when the peer closed the stream between or inside a header, i.e. a
    /// normal end of the conversation rather than a fault.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::ShortHeaderRead { .. })
    }

    /// True when the stream is still positioned on a frame boundary, so the
    /// caller may keep using the connection.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Codec(_)
                | Self::LockTimeout { .. }
                | Self::Protocol(ProtocolError::PayloadTooLarge { .. })
        )
    }
}
