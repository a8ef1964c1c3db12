//! Turmoil-backed transport.
//!
//! Turmoil simulates TCP between named hosts with virtual time, so latency,
//! loss, and partitions are reproducible. The simulated streams are plain
//! `AsyncRead + AsyncWrite`, which is all the framers need.

use std::io;

use async_trait::async_trait;
use qsct_core::Transport;
use tokio::io::{ReadHalf, WriteHalf};
use tracing::trace;
use turmoil::net::{TcpListener, TcpStream};

/// [`Transport`] over turmoil's simulated network.
pub struct SimTransport {
    listener: Option<TcpListener>,
}

impl SimTransport {
    /// Transport listening on `addr` inside the current simulated host.
    pub async fn bind(addr: &str) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener: Some(listener) })
    }

    /// Transport that only connects out.
    pub fn client() -> Self {
        Self { listener: None }
    }

    /// Open a raw simulated stream to `addr` (e.g. `"server:443"`).
    pub async fn connect_to(addr: &str) -> io::Result<TcpStream> {
        TcpStream::connect(addr).await
    }

    fn split(stream: TcpStream) -> (WriteHalf<TcpStream>, ReadHalf<TcpStream>) {
        let (recv, send) = tokio::io::split(stream);
        (send, recv)
    }
}

#[async_trait]
impl Transport for SimTransport {
    type SendStream = WriteHalf<TcpStream>;
    type RecvStream = ReadHalf<TcpStream>;

    async fn accept(&self) -> io::Result<(Self::SendStream, Self::RecvStream)> {
        let Some(listener) = &self.listener else {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "transport is not bound"));
        };
        let (stream, peer) = listener.accept().await?;
        trace!(%peer, "sim accept");
        Ok(Self::split(stream))
    }

    async fn connect(&self, remote: &str) -> io::Result<(Self::SendStream, Self::RecvStream)> {
        let stream = Self::connect_to(remote).await?;
        Ok(Self::split(stream))
    }
}
