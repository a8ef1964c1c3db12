//! Tokio TCP transport.

use std::{io, net::SocketAddr};

use async_trait::async_trait;
use qsct_core::Transport;
use tokio::net::{
    TcpListener, TcpStream,
    tcp::{OwnedReadHalf, OwnedWriteHalf},
};
use tracing::trace;

/// [`Transport`] over tokio TCP sockets.
#[derive(Debug, Default)]
pub struct TcpTransport {
    listener: Option<TcpListener>,
}

impl TcpTransport {
    /// Transport listening on `addr`.
    pub async fn bind(addr: &str) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener: Some(listener) })
    }

    /// Transport that only connects out.
    pub fn client() -> Self {
        Self { listener: None }
    }

    /// Address the listener is bound to, if any.
    pub fn local_addr(&self) -> Option<io::Result<SocketAddr>> {
        self.listener.as_ref().map(TcpListener::local_addr)
    }

    fn split(stream: TcpStream) -> io::Result<(OwnedWriteHalf, OwnedReadHalf)> {
        // frames are written header-then-payload; don't let Nagle hold the header
        stream.set_nodelay(true)?;
        let (recv, send) = stream.into_split();
        Ok((send, recv))
    }
}

#[async_trait]
impl Transport for TcpTransport {
    type SendStream = OwnedWriteHalf;
    type RecvStream = OwnedReadHalf;

    async fn accept(&self) -> io::Result<(Self::SendStream, Self::RecvStream)> {
        let Some(listener) = &self.listener else {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "transport is not bound"));
        };
        let (stream, peer) = listener.accept().await?;
        trace!(%peer, "tcp accept");
        Self::split(stream)
    }

    async fn connect(&self, remote: &str) -> io::Result<(Self::SendStream, Self::RecvStream)> {
        let stream = TcpStream::connect(remote).await?;
        Self::split(stream)
    }
}
