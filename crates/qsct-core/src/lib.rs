//! QSCT framing core.
//!
//! Moves length-prefixed frames across byte streams and keeps concurrent
//! callers from interleaving them. The wire format and the receive state
//! machine live in `qsct-proto`; this crate supplies the I/O around them.
//!
//! # Architecture
//!
//! Streams are caller-owned. The framers borrow a stream half for one frame at
//! a time and never open or close anything. Both the blocking [`Framer`] and
//! the tokio [`AsyncFramer`] drive the same [`qsct_proto::FrameDecoder`], so
//! short reads, closed streams, and oversized frames are classified
//! identically regardless of runtime.
//!
//! [`Channel`] and [`AsyncChannel`] are the concurrency guards: each owns the
//! send half and the receive half of one connection behind two independent
//! locks, so one send and one receive may proceed at once but two sends (or
//! two receives) may not.
//!
//! # Components
//!
//! - [`stream`]: Blocking stream halves ([`SendStream`], [`RecvStream`])
//! - [`framer`]: Blocking frame send/receive
//! - [`channel`]: Blocking concurrency guard
//! - [`codec`]: Pluggable payload serialization
//! - [`async_io`]: Tokio framer and concurrency guard
//! - [`transport`]: Async connection factory used by servers
//! - [`error`]: Framing error types

pub mod async_io;
pub mod channel;
pub mod codec;
pub mod error;
pub mod framer;
pub mod stream;
pub mod transport;

pub use async_io::{AsyncChannel, AsyncFramer};
pub use channel::{Channel, ChannelConfig, Direction, RecvGuard, SendGuard};
pub use codec::{BincodeCodec, CborCodec, CodecError, PayloadCodec};
pub use error::{FrameError, Result};
pub use framer::{Framer, FramerConfig};
pub use stream::{RecvStream, SendStream, StreamConnection};
pub use transport::Transport;
