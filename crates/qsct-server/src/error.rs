//! Server error types.

use std::io;

use qsct_core::FrameError;
use thiserror::Error;

/// Result alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors that stop the server or a client session.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding, accepting, or connecting failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A frame could not be exchanged.
    #[error("framing error: {0}")]
    Frame(#[from] FrameError),

    /// The peer closed the connection before replying.
    #[error("connection closed before reply to request {index}")]
    NoReply {
        /// Zero-based index of the unanswered request.
        index: usize,
    },
}
