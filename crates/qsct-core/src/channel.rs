//! Blocking concurrency guard.
//!
//! A [`Channel`] owns both halves of one connection, each behind its own
//! mutex. Any number of threads may share a `&Channel`: sends are serialized
//! against sends and receives against receives, while a send and a receive
//! can run at the same time.
//!
//! Acquire/release is RAII. [`Channel::lock_send`] returns a [`SendGuard`];
//! the lock is released when the guard drops, including while unwinding. The
//! convenience methods ([`Channel::send_bytes`], [`Channel::receive`], ...)
//! hold their lock for exactly one frame.
//!
//! With [`ChannelConfig::lock_timeout`] unset, acquisition blocks forever,
//! like a classic mutex. Setting it turns a stalled peer thread into a
//! [`FrameError::LockTimeout`] instead of a hang.

use std::{fmt, io, time::Duration};

use bytes::Bytes;
use parking_lot::{Mutex, MutexGuard};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{
    codec::{CborCodec, PayloadCodec},
    error::{FrameError, Result},
    framer::{Framer, FramerConfig},
    stream::{RecvStream, SendStream, StreamConnection},
};

/// Which of the two locks an operation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Outbound frames.
    Send,
    /// Inbound frames.
    Receive,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Send => f.write_str("send"),
            Self::Receive => f.write_str("receive"),
        }
    }
}

/// Channel configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelConfig {
    /// Framing limits.
    pub framer: FramerConfig,
    /// Longest wait for either lock. `None` waits indefinitely.
    pub lock_timeout: Option<Duration>,
}

/// One connection shared by many callers.
pub struct Channel<S, R, C = CborCodec> {
    sender: Mutex<S>,
    receiver: Mutex<R>,
    framer: Framer,
    codec: C,
    lock_timeout: Option<Duration>,
}

impl<S, R, C> fmt::Debug for Channel<S, R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("framer", &self.framer)
            .field("lock_timeout", &self.lock_timeout)
            .field("send_locked", &self.sender.is_locked())
            .field("receive_locked", &self.receiver.is_locked())
            .finish_non_exhaustive()
    }
}

impl<S: SendStream, R: RecvStream> Channel<S, R> {
    /// Channel over explicit halves with default configuration and CBOR.
    pub fn new(sender: S, receiver: R) -> Self {
        Self::with_config(sender, receiver, ChannelConfig::default())
    }

    /// Channel over explicit halves with CBOR payloads.
    pub fn with_config(sender: S, receiver: R, config: ChannelConfig) -> Self {
        Self::with_codec(sender, receiver, config, CborCodec)
    }

    /// Split `connection` and guard both halves.
    pub fn from_connection<T>(connection: T, config: ChannelConfig) -> io::Result<Self>
    where
        T: StreamConnection<Send = S, Recv = R>,
    {
        let (sender, receiver) = connection.split()?;
        Ok(Self::with_config(sender, receiver, config))
    }
}

impl<S: SendStream, R: RecvStream, C: PayloadCodec> Channel<S, R, C> {
    /// Channel with an explicit payload codec.
    pub fn with_codec(sender: S, receiver: R, config: ChannelConfig, codec: C) -> Self {
        Self {
            sender: Mutex::new(sender),
            receiver: Mutex::new(receiver),
            framer: Framer::new(config.framer),
            codec,
            lock_timeout: config.lock_timeout,
        }
    }

    /// Framer used for every frame on this channel.
    pub fn framer(&self) -> &Framer {
        &self.framer
    }

    /// Payload codec.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Acquire the send lock.
    pub fn lock_send(&self) -> Result<SendGuard<'_, S>> {
        let stream = acquire(&self.sender, self.lock_timeout, Direction::Send)?;
        Ok(SendGuard { stream, framer: &self.framer })
    }

    /// Acquire the receive lock.
    pub fn lock_recv(&self) -> Result<RecvGuard<'_, R>> {
        let stream = acquire(&self.receiver, self.lock_timeout, Direction::Receive)?;
        Ok(RecvGuard { stream, framer: &self.framer })
    }

    /// Send one frame carrying `payload`.
    pub fn send_bytes(&self, payload: &[u8]) -> Result<()> {
        self.lock_send()?.send_bytes(payload)
    }

    /// Receive one frame. `Ok(None)` means the peer closed the stream.
    pub fn receive_bytes(&self) -> Result<Option<Bytes>> {
        self.lock_recv()?.receive_bytes()
    }

    /// Encode `value` and send it as one frame.
    ///
    /// Encoding happens before the lock is taken, so a slow serializer never
    /// blocks other senders.
    pub fn send<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let payload = self.codec.encode(value)?;
        self.send_bytes(&payload)
    }

    /// Receive one frame and decode it.
    ///
    /// The frame is consumed in full before decoding, so a
    /// [`FrameError::Codec`] leaves the next frame readable.
    pub fn receive<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let Some(payload) = self.receive_bytes()? else {
            return Ok(None);
        };
        self.decode(&payload).map(Some)
    }

    /// Send `payload` and wait for the reply frame.
    ///
    /// The receive lock is taken first and held across the send, so
    /// concurrent requests on one channel each read the reply to their own
    /// request. Plain sends may still slip in between; don't mix
    /// request/response and one-way traffic in the same direction if replies
    /// must pair up.
    pub fn request_bytes(&self, payload: &[u8]) -> Result<Option<Bytes>> {
        let mut recv = self.lock_recv()?;
        self.lock_send()?.send_bytes(payload)?;
        recv.receive_bytes()
    }

    /// Typed [`Channel::request_bytes`].
    pub fn request<Req, Resp>(&self, request: &Req) -> Result<Option<Resp>>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let payload = self.codec.encode(request)?;
        let Some(reply) = self.request_bytes(&payload)? else {
            return Ok(None);
        };
        self.decode(&reply).map(Some)
    }

    /// Consume the channel, returning both halves.
    pub fn into_inner(self) -> (S, R) {
        (self.sender.into_inner(), self.receiver.into_inner())
    }

    fn decode<T: DeserializeOwned>(&self, payload: &[u8]) -> Result<T> {
        self.codec.decode(payload).map_err(|err| {
            warn!(%err, len = payload.len(), "payload decode failed; frame discarded");
            FrameError::from(err)
        })
    }
}

fn acquire<T>(
    lock: &Mutex<T>,
    timeout: Option<Duration>,
    direction: Direction,
) -> Result<MutexGuard<'_, T>> {
    match timeout {
        None => Ok(lock.lock()),
        Some(waited) => lock.try_lock_for(waited).ok_or_else(|| {
            debug!(%direction, ?waited, "lock acquisition timed out");
            FrameError::LockTimeout { direction, waited }
        }),
    }
}

/// Exclusive access to a channel's send half.
///
/// Several frames sent through one guard reach the wire back to back.
pub struct SendGuard<'a, S> {
    stream: MutexGuard<'a, S>,
    framer: &'a Framer,
}

impl<S: SendStream> SendGuard<'_, S> {
    /// Send one frame.
    pub fn send_bytes(&mut self, payload: &[u8]) -> Result<()> {
        self.framer.send(&mut *self.stream, payload)
    }
}

/// Exclusive access to a channel's receive half.
pub struct RecvGuard<'a, R> {
    stream: MutexGuard<'a, R>,
    framer: &'a Framer,
}

impl<R: RecvStream> RecvGuard<'_, R> {
    /// Receive one frame. `Ok(None)` means the peer closed the stream.
    pub fn receive_bytes(&mut self) -> Result<Option<Bytes>> {
        self.framer.receive(&mut *self.stream)
    }
}
