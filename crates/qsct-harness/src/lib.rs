//! Deterministic test harness for QSCT framing.
//!
//! Two ways to put bytes between a sender and a receiver under test control:
//!
//! - [`pipe`]: blocking in-memory pipes whose reader hands out bytes in a
//!   chosen [`ChunkPolicy`] (whole, fixed-size, or seeded random slices), for
//!   exercising short-read handling and thread-level concurrency.
//! - [`sim_transport`]: a turmoil-backed [`qsct_core::Transport`] for async
//!   tests under simulated latency, packet loss, and partitions.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod pipe;
pub mod sim_transport;

pub use pipe::{ChunkPolicy, PipeEnd, PipeReader, PipeWriter, duplex, loopback_channels, pipe};
pub use sim_transport::SimTransport;
