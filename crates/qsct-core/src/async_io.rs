//! Tokio rendition of the framer and the concurrency guard.
//!
//! Same wire format and decoder as the blocking side; the only differences are
//! `.await` points and `tokio::sync::Mutex` in place of `parking_lot`.
//!
//! [`AsyncFramer::receive`] is not cancellation safe: dropping the future part
//! way through a frame loses the bytes already read. Put timeouts around the
//! whole conversation, not around individual receives.

use std::{fmt, time::Duration};

use bytes::Bytes;
use qsct_proto::FrameHeader;
use serde::{Serialize, de::DeserializeOwned};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    sync::{Mutex, MutexGuard},
};
use tracing::{debug, trace, warn};

use crate::{
    channel::{ChannelConfig, Direction},
    codec::{CborCodec, PayloadCodec},
    error::{FrameError, Result},
    framer::FramerConfig,
};

/// Async length-prefixed framer.
#[derive(Debug, Clone, Default)]
pub struct AsyncFramer {
    config: FramerConfig,
}

impl AsyncFramer {
    /// Framer with the given configuration.
    pub fn new(config: FramerConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub fn config(&self) -> &FramerConfig {
        &self.config
    }

    /// Write one frame and flush.
    pub async fn send<W: AsyncWrite + Unpin + ?Sized>(
        &self,
        writer: &mut W,
        payload: &[u8],
    ) -> Result<()> {
        let header = self.config.header_for(payload)?;

        writer.write_all(&header.to_bytes()).await?;
        writer.write_all(payload).await?;
        writer.flush().await?;

        trace!(len = payload.len(), "frame sent");
        Ok(())
    }

    /// Read one frame. `Ok(None)` means the stream closed on a frame boundary.
    pub async fn receive<R: AsyncRead + Unpin + ?Sized>(
        &self,
        reader: &mut R,
    ) -> Result<Option<Bytes>> {
        let mut decoder = self.config.decoder();
        let mut buf = vec![0u8; self.config.read_chunk_size.max(FrameHeader::SIZE)];

        loop {
            if let Some(result) = decoder.take() {
                return FramerConfig::on_decoded(result);
            }

            let want = decoder.wants();
            let n = reader.read(&mut buf[..want]).await?;
            if n == 0 {
                return FramerConfig::on_stream_end(&decoder);
            }

            decoder.feed(&buf[..n]);
        }
    }
}

/// Async connection shared by many tasks.
///
/// Mirrors [`crate::Channel`]: one lock per direction, optional timed
/// acquisition, typed helpers through a [`PayloadCodec`].
pub struct AsyncChannel<W, R, C = CborCodec> {
    sender: Mutex<W>,
    receiver: Mutex<R>,
    framer: AsyncFramer,
    codec: C,
    lock_timeout: Option<Duration>,
}

impl<W, R, C> fmt::Debug for AsyncChannel<W, R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncChannel")
            .field("framer", &self.framer)
            .field("lock_timeout", &self.lock_timeout)
            .finish_non_exhaustive()
    }
}

impl<W, R> AsyncChannel<W, R>
where
    W: AsyncWrite + Unpin + Send,
    R: AsyncRead + Unpin + Send,
{
    /// Channel over split halves with default configuration and CBOR.
    pub fn new(sender: W, receiver: R) -> Self {
        Self::with_config(sender, receiver, ChannelConfig::default())
    }

    /// Channel over split halves with CBOR payloads.
    pub fn with_config(sender: W, receiver: R, config: ChannelConfig) -> Self {
        Self::with_codec(sender, receiver, config, CborCodec)
    }
}

impl<W, R, C> AsyncChannel<W, R, C>
where
    W: AsyncWrite + Unpin + Send,
    R: AsyncRead + Unpin + Send,
    C: PayloadCodec,
{
    /// Channel with an explicit payload codec.
    pub fn with_codec(sender: W, receiver: R, config: ChannelConfig, codec: C) -> Self {
        Self {
            sender: Mutex::new(sender),
            receiver: Mutex::new(receiver),
            framer: AsyncFramer::new(config.framer),
            codec,
            lock_timeout: config.lock_timeout,
        }
    }

    /// Send one frame.
    pub async fn send_bytes(&self, payload: &[u8]) -> Result<()> {
        let mut sender = self.acquire(&self.sender, Direction::Send).await?;
        self.framer.send(&mut *sender, payload).await
    }

    /// Receive one frame. `Ok(None)` means the peer closed the stream.
    pub async fn receive_bytes(&self) -> Result<Option<Bytes>> {
        let mut receiver = self.acquire(&self.receiver, Direction::Receive).await?;
        self.framer.receive(&mut *receiver).await
    }

    /// Encode `value` and send it as one frame.
    pub async fn send<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let payload = self.codec.encode(value)?;
        self.send_bytes(&payload).await
    }

    /// Receive one frame and decode it after consuming it in full.
    pub async fn receive<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let Some(payload) = self.receive_bytes().await? else {
            return Ok(None);
        };
        self.decode(&payload).map(Some)
    }

    /// Send `payload` and wait for the reply, holding the receive lock
    /// throughout so the reply pairs with this request.
    pub async fn request_bytes(&self, payload: &[u8]) -> Result<Option<Bytes>> {
        let mut receiver = self.acquire(&self.receiver, Direction::Receive).await?;
        {
            let mut sender = self.acquire(&self.sender, Direction::Send).await?;
            self.framer.send(&mut *sender, payload).await?;
        }
        self.framer.receive(&mut *receiver).await
    }

    /// Typed [`AsyncChannel::request_bytes`].
    pub async fn request<Req, Resp>(&self, request: &Req) -> Result<Option<Resp>>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let payload = self.codec.encode(request)?;
        let Some(reply) = self.request_bytes(&payload).await? else {
            return Ok(None);
        };
        self.decode(&reply).map(Some)
    }

    /// Shut down the write half so the peer observes a clean close.
    pub async fn shutdown(&self) -> Result<()> {
        let mut sender = self.acquire(&self.sender, Direction::Send).await?;
        sender.shutdown().await?;
        Ok(())
    }

    /// Consume the channel, returning both halves.
    pub fn into_inner(self) -> (W, R) {
        (self.sender.into_inner(), self.receiver.into_inner())
    }

    async fn acquire<'a, T>(
        &self,
        lock: &'a Mutex<T>,
        direction: Direction,
    ) -> Result<MutexGuard<'a, T>> {
        match self.lock_timeout {
            None => Ok(lock.lock().await),
            Some(waited) => tokio::time::timeout(waited, lock.lock()).await.map_err(|_| {
                debug!(%direction, ?waited, "lock acquisition timed out");
                FrameError::LockTimeout { direction, waited }
            }),
        }
    }

    fn decode<T: DeserializeOwned>(&self, payload: &[u8]) -> Result<T> {
        self.codec.decode(payload).map_err(|err| {
            warn!(%err, len = payload.len(), "payload decode failed; frame discarded");
            FrameError::from(err)
        })
    }
}
