//! Accept loop and per-connection request/response service.

use std::{io, sync::Arc, time::Duration};

use qsct_core::{AsyncChannel, ChannelConfig, FrameError, Transport};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::{error::Result, handler::Handler};

/// Pause after a failed accept, so persistent failures (e.g. out of file
/// descriptors) don't spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Server configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerConfig {
    /// Framing limits and lock timeout applied to every connection.
    pub channel: ChannelConfig,
}

/// Request/response server.
#[derive(Debug)]
pub struct Server<H> {
    handler: Arc<H>,
    config: ServerConfig,
}

impl<H: Handler> Server<H> {
    /// Server answering requests with `handler`.
    pub fn new(handler: H, config: ServerConfig) -> Self {
        Self { handler: Arc::new(handler), config }
    }

    /// Accept connections until the transport fails.
    ///
    /// Each connection is served on its own task. A connection that ends in
    /// error is logged and dropped without affecting the others.
    pub async fn run<T: Transport>(&self, transport: T) -> Result<()> {
        let mut next_id: u64 = 0;

        loop {
            let (send, recv) = match transport.accept().await {
                Ok(halves) => halves,
                Err(err) if err.kind() == io::ErrorKind::NotConnected => return Err(err.into()),
                Err(err) => {
                    warn!(%err, "accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                },
            };

            let id = next_id;
            next_id += 1;
            debug!(connection = id, "accepted");

            let handler = Arc::clone(&self.handler);
            let config = self.config.channel;
            tokio::spawn(async move {
                match serve_connection(send, recv, handler, config).await {
                    Ok(served) => debug!(connection = id, served, "connection closed"),
                    Err(err) => warn!(connection = id, %err, "connection failed"),
                }
            });
        }
    }
}

/// Answer requests on one connection until the peer closes it.
///
/// Returns the number of requests handled. Frames that are too large or
/// otherwise skippable are logged and the connection keeps going; transport
/// failures and truncated frames end it.
pub async fn serve_connection<W, R, H>(
    send: W,
    recv: R,
    handler: Arc<H>,
    config: ChannelConfig,
) -> std::result::Result<u64, FrameError>
where
    W: AsyncWrite + Unpin + Send,
    R: AsyncRead + Unpin + Send,
    H: Handler,
{
    let channel = AsyncChannel::with_config(send, recv, config);
    let mut served = 0;

    loop {
        match channel.receive_bytes().await {
            Ok(Some(request)) => {
                served += 1;
                if let Some(reply) = handler.handle(request) {
                    channel.send_bytes(&reply).await?;
                }
            },
            Ok(None) => break,
            Err(err) if err.is_closed() => {
                info!(%err, "peer closed mid-header");
                break;
            },
            Err(err) if err.is_recoverable() => warn!(%err, "skipping request"),
            Err(err) => return Err(err),
        }
    }

    Ok(served)
}
