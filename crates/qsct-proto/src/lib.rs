//! Wire format for the QSCT framing protocol.
//!
//! A frame is an 8-byte big-endian length header followed by exactly that many
//! payload bytes. There is no magic number, version byte, or checksum: any
//! typing or versioning lives inside the payload, which this crate treats as
//! an opaque blob.
//!
//! ```text
//! +------------------+-------------------------+
//! | length (8 bytes, | payload (length bytes)  |
//! | big-endian, u64) |                         |
//! +------------------+-------------------------+
//! ```
//!
//! The crate is sans-IO. [`FrameDecoder`] is the receive state machine: the
//! caller asks it how many bytes it wants next, reads at most that many from
//! whatever stream it owns, and feeds them back in. Blocking and async
//! framers in `qsct-core` drive the same decoder, so short reads are handled
//! in exactly one place.
//!
//! # Security
//!
//! Header parsing uses compile-time verified layouts via `zerocopy`. Declared
//! payload lengths above the configured limit are never buffered; the decoder
//! drains them and reports [`ProtocolError::PayloadTooLarge`].
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod decoder;
pub mod errors;
pub mod frame;
pub mod header;

pub use decoder::{DecodeState, FrameDecoder, StreamEnd};
pub use errors::{ProtocolError, Result};
pub use frame::Frame;
pub use header::FrameHeader;

/// Default upper bound on a single payload (16 MiB).
pub const DEFAULT_MAX_PAYLOAD_SIZE: u64 = 16 * 1024 * 1024;

/// Default largest read requested from a stream while accumulating a payload.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 4096;
