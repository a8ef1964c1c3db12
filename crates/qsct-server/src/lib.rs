//! QSCT request/response server.
//!
//! Every frame a client sends is a request; the server answers it with one
//! frame produced by a [`Handler`]. Connections are served concurrently, one
//! tokio task each, and each connection's frames flow through an
//! [`qsct_core::AsyncChannel`].
//!
//! The accept loop is generic over [`qsct_core::Transport`], so the same
//! server runs on real TCP ([`TcpTransport`]) and on turmoil's simulated
//! network in the test harness.
//!
//! # Components
//!
//! - [`Server`] / [`ServerConfig`]: accept loop and per-connection service
//! - [`Handler`] / [`EchoHandler`]: request to reply mapping
//! - [`TcpTransport`]: tokio TCP implementation of `Transport`
//! - [`client`]: blocking client used by the `qsct send` command
//! - [`cli`]: command-line arguments

pub mod cli;
pub mod client;
mod error;
mod handler;
mod server;
mod tcp;

pub use error::{Result, ServerError};
pub use handler::{EchoHandler, Handler};
pub use server::{Server, ServerConfig, serve_connection};
pub use tcp::TcpTransport;
