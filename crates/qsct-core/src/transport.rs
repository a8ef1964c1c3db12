//! Transport abstraction for async servers and clients.
//!
//! Production uses tokio TCP (`qsct-server`), tests use turmoil's simulated
//! TCP (`qsct-harness`). Either way a connection arrives already split into
//! halves, ready to be wrapped in an [`crate::AsyncChannel`].

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// Factory for stream connections.
///
/// One value may play both roles: a transport bound to a local address
/// accepts, and any transport can connect out.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Outbound half of a connection.
    type SendStream: AsyncWrite + Unpin + Send + 'static;

    /// Inbound half of a connection.
    type RecvStream: AsyncRead + Unpin + Send + 'static;

    /// Accept the next incoming connection.
    ///
    /// Blocks until a peer connects. Fails with
    /// [`io::ErrorKind::NotConnected`] if the transport was not bound to a
    /// local address.
    async fn accept(&self) -> io::Result<(Self::SendStream, Self::RecvStream)>;

    /// Connect to `remote` (a `host:port` string).
    async fn connect(&self, remote: &str) -> io::Result<(Self::SendStream, Self::RecvStream)>;
}
