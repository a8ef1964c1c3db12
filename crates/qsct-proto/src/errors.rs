//! Error types for wire-level framing.

use thiserror::Error;

/// Result alias for wire-format operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Violations of the frame wire format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Buffer is shorter than the structure being parsed from it.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Bytes required.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },

    /// Declared or actual payload length exceeds the configured limit.
    #[error("payload of {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge {
        /// Payload length in bytes.
        size: u64,
        /// Configured maximum.
        limit: u64,
    },

    /// Header length disagrees with the bytes that follow it.
    #[error("header declares {declared} payload bytes but {actual} are present")]
    LengthMismatch {
        /// Length carried in the header.
        declared: u64,
        /// Bytes actually present after the header.
        actual: u64,
    },
}
