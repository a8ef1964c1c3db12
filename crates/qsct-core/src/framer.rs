//! Blocking frame send/receive.
//!
//! A [`Framer`] writes one frame per [`Framer::send`] and reads one frame per
//! [`Framer::receive`]. It holds only configuration, so a single framer can
//! serve any number of streams; it does no locking of its own (see
//! [`crate::Channel`] for that).
//!
//! # Receive
//!
//! ```text
//! AwaitingHeader ──8 bytes──> AwaitingPayload(remaining) ──> Complete
//!       │
//!       └── 0 bytes then close ──> Closed (Ok(None))
//! ```
//!
//! Every read error aborts the whole receive. There is no state in which a
//! successful return leaves part of a frame on the wire.

use bytes::Bytes;
use qsct_proto::{
    DEFAULT_MAX_PAYLOAD_SIZE, DEFAULT_READ_CHUNK_SIZE, FrameDecoder, FrameHeader, ProtocolError,
    StreamEnd,
};
use tracing::{trace, warn};

use crate::{
    error::{FrameError, Result},
    stream::{RecvStream, SendStream},
};

/// Framer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramerConfig {
    /// Largest payload accepted in either direction.
    pub max_payload_size: u64,
    /// Largest single read issued while accumulating a payload.
    pub read_chunk_size: usize,
}

impl Default for FramerConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

impl FramerConfig {
    /// Fresh decoder honouring this configuration.
    pub fn decoder(&self) -> FrameDecoder {
        FrameDecoder::new(self.max_payload_size, self.read_chunk_size)
    }

    /// Header for `payload`, or an error if it is over the size limit.
    pub fn header_for(&self, payload: &[u8]) -> Result<FrameHeader> {
        let size = payload.len() as u64;
        if size > self.max_payload_size {
            return Err(ProtocolError::PayloadTooLarge { size, limit: self.max_payload_size }.into());
        }
        Ok(FrameHeader::new(size))
    }

    /// Map a closed stream at the decoder's position to a receive outcome.
    pub(crate) fn on_stream_end(decoder: &FrameDecoder) -> Result<Option<Bytes>> {
        match decoder.stream_end() {
            StreamEnd::Clean => Ok(None),
            StreamEnd::MidHeader { received } => Err(FrameError::ShortHeaderRead { received }),
            StreamEnd::MidPayload { expected, received } => {
                Err(FrameError::TruncatedPayload { expected, received })
            },
        }
    }

    /// Turn a decoder result into a receive outcome, logging drained frames.
    pub(crate) fn on_decoded(
        result: qsct_proto::Result<qsct_proto::Frame>,
    ) -> Result<Option<Bytes>> {
        match result {
            Ok(frame) => {
                trace!(len = frame.payload().len(), "frame received");
                Ok(Some(frame.into_payload()))
            },
            Err(err) => {
                warn!(%err, "dropped oversized frame");
                Err(err.into())
            },
        }
    }
}

/// Blocking length-prefixed framer.
#[derive(Debug, Clone, Default)]
pub struct Framer {
    config: FramerConfig,
}

impl Framer {
    /// Framer with the given configuration.
    pub fn new(config: FramerConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub fn config(&self) -> &FramerConfig {
        &self.config
    }

    /// Write one frame: the 8-byte header, then the payload.
    ///
    /// On success the whole frame has been handed to the stream. Delivery to
    /// the peer is not confirmed. Stream errors are returned as
    /// [`FrameError::Transport`] without retry.
    pub fn send<S: SendStream + ?Sized>(&self, stream: &mut S, payload: &[u8]) -> Result<()> {
        let header = self.config.header_for(payload)?;

        stream.send(&header.to_bytes())?;
        if !payload.is_empty() {
            stream.send(payload)?;
        }
        SendStream::flush(stream)?;

        trace!(len = payload.len(), "frame sent");
        Ok(())
    }

    /// Read one frame and return its payload.
    ///
    /// Returns `Ok(None)` if the stream closes before any header byte
    /// arrives. A zero-length frame returns `Ok(Some(empty))`. Reads never
    /// ask for more than the remainder of the header or
    /// `min(read_chunk_size, remaining)` payload bytes.
    pub fn receive<R: RecvStream + ?Sized>(&self, stream: &mut R) -> Result<Option<Bytes>> {
        let mut decoder = self.config.decoder();
        let mut buf = vec![0u8; self.config.read_chunk_size.max(FrameHeader::SIZE)];

        loop {
            if let Some(result) = decoder.take() {
                return FramerConfig::on_decoded(result);
            }

            let want = decoder.wants();
            let n = match stream.recv(&mut buf[..want]) {
                Ok(n) => n,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };

            if n == 0 {
                return FramerConfig::on_stream_end(&decoder);
            }

            decoder.feed(&buf[..n]);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    /// Reader that returns at most `max_per_read` bytes and records every
    /// requested length.
    struct Trickle<'a> {
        data: &'a [u8],
        max_per_read: usize,
        requests: Vec<usize>,
    }

    impl<'a> Trickle<'a> {
        fn new(data: &'a [u8], max_per_read: usize) -> Self {
            Self { data, max_per_read, requests: Vec::new() }
        }
    }

    impl io::Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.requests.push(buf.len());
            let n = buf.len().min(self.max_per_read).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    /// Reader over `data` that fails with `kind` on call number `fail_on`
    /// (zero-based) and reads normally otherwise.
    struct Flaky<'a> {
        data: &'a [u8],
        fail_on: usize,
        kind: io::ErrorKind,
        calls: usize,
    }

    impl io::Read for Flaky<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let call = self.calls;
            self.calls += 1;
            if call == self.fail_on {
                return Err(io::Error::new(self.kind, "injected"));
            }
            io::Read::read(&mut self.data, buf)
        }
    }

    /// Writer that fails every call.
    struct Broken;

    impl io::Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn framed(payload: &[u8]) -> Vec<u8> {
        let mut wire = Vec::new();
        Framer::default().send(&mut wire, payload).unwrap();
        wire
    }

    #[test]
    fn hello_on_the_wire() {
        let wire = framed(b"hello");
        insta::assert_snapshot!(hex::encode(&wire), @"000000000000000568656c6c6f");
    }

    #[test]
    fn header_encodes_payload_length() {
        for len in [0usize, 1, 255, 256, 4096, 70_000] {
            let wire = framed(&vec![0xabu8; len]);
            let declared = u64::from_be_bytes(wire[..8].try_into().unwrap());
            assert_eq!(declared, len as u64);
            assert_eq!(wire.len(), 8 + len);
        }
    }

    #[test]
    fn roundtrip_hello() {
        let wire = framed(b"hello");
        let payload = Framer::default().receive(&mut wire.as_slice()).unwrap();
        assert_eq!(payload.as_deref(), Some(&b"hello"[..]));
    }

    #[test]
    fn empty_payload_is_not_closed() {
        let wire = framed(b"");
        let mut reader = wire.as_slice();
        let framer = Framer::default();

        assert_eq!(framer.receive(&mut reader).unwrap(), Some(Bytes::new()));
        assert_eq!(framer.receive(&mut reader).unwrap(), None);
    }

    #[test]
    fn closed_before_header_is_none() {
        let mut reader: &[u8] = &[];
        assert_eq!(Framer::default().receive(&mut reader).unwrap(), None);
    }

    #[test]
    fn partial_header_then_close() {
        let mut reader: &[u8] = &[0, 0, 0];
        let err = Framer::default().receive(&mut reader).unwrap_err();
        assert!(matches!(err, FrameError::ShortHeaderRead { received: 3 }));
        assert!(err.is_closed());
    }

    #[test]
    fn partial_payload_then_close() {
        let wire = framed(b"hello");
        let mut reader = &wire[..10];
        let err = Framer::default().receive(&mut reader).unwrap_err();
        assert!(matches!(err, FrameError::TruncatedPayload { expected: 5, received: 2 }));
        assert!(!err.is_closed());
    }

    #[test]
    fn one_byte_reads_reassemble() {
        let payload: Vec<u8> = (0..=255).collect();
        let wire = framed(&payload);
        let mut reader = Trickle::new(&wire, 1);

        let received = Framer::default().receive(&mut reader).unwrap().unwrap();
        assert_eq!(&received[..], &payload[..]);
        assert_eq!(reader.requests.len(), wire.len());
    }

    #[test]
    fn header_short_reads_are_retried() {
        let wire = framed(b"abc");
        let mut reader = Trickle::new(&wire, 3);

        let received = Framer::default().receive(&mut reader).unwrap().unwrap();
        assert_eq!(&received[..], b"abc");
        assert_eq!(&reader.requests[..3], &[8, 5, 2]);
    }

    #[test]
    fn exact_chunk_payload_reads_once() {
        let payload = vec![1u8; 4096];
        let wire = framed(&payload);
        let mut reader = Trickle::new(&wire, usize::MAX);

        let received = Framer::default().receive(&mut reader).unwrap().unwrap();
        assert_eq!(received.len(), 4096);
        assert_eq!(reader.requests, vec![8, 4096]);
    }

    #[test]
    fn one_past_chunk_payload_reads_twice() {
        let payload: Vec<u8> = (0..4097u32).map(|i| (i % 251) as u8).collect();
        let wire = framed(&payload);
        let mut reader = Trickle::new(&wire, usize::MAX);

        let received = Framer::default().receive(&mut reader).unwrap().unwrap();
        assert_eq!(&received[..], &payload[..]);
        assert_eq!(reader.requests, vec![8, 4096, 1]);
    }

    #[test]
    fn oversized_send_writes_nothing() {
        let framer = Framer::new(FramerConfig { max_payload_size: 4, ..FramerConfig::default() });
        let mut wire = Vec::new();

        let err = framer.send(&mut wire, b"12345").unwrap_err();
        assert!(matches!(
            err,
            FrameError::Protocol(ProtocolError::PayloadTooLarge { size: 5, limit: 4 })
        ));
        assert!(err.is_recoverable());
        assert!(wire.is_empty());
    }

    #[test]
    fn oversized_receive_keeps_stream_aligned() {
        let mut wire = framed(b"far too long");
        wire.extend(framed(b"ok"));

        let framer = Framer::new(FramerConfig { max_payload_size: 4, read_chunk_size: 3 });
        let mut reader = wire.as_slice();

        let err = framer.receive(&mut reader).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Protocol(ProtocolError::PayloadTooLarge { size: 12, limit: 4 })
        ));
        assert_eq!(framer.receive(&mut reader).unwrap().as_deref(), Some(&b"ok"[..]));
    }

    #[test]
    fn transport_errors_pass_through() {
        let err = Framer::default().send(&mut Broken, b"x").unwrap_err();
        match err {
            FrameError::Transport(io) => assert_eq!(io.kind(), io::ErrorKind::ConnectionReset),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let wire = framed(b"hello world");
        for fail_on in 0..2 {
            let mut reader =
                Flaky { data: &wire, fail_on, kind: io::ErrorKind::Interrupted, calls: 0 };
            let received = Framer::default().receive(&mut reader).unwrap();
            assert_eq!(received.as_deref(), Some(&b"hello world"[..]), "interrupt on read {fail_on}");
        }
    }

    #[test]
    fn read_errors_pass_through() {
        let wire = framed(b"hello world");
        // first read is the header, second the payload
        for fail_on in 0..2 {
            let mut reader =
                Flaky { data: &wire, fail_on, kind: io::ErrorKind::ConnectionReset, calls: 0 };
            match Framer::default().receive(&mut reader).unwrap_err() {
                FrameError::Transport(io) => assert_eq!(io.kind(), io::ErrorKind::ConnectionReset),
                other => panic!("unexpected error on read {fail_on}: {other:?}"),
            }
        }
    }

    proptest::proptest! {
        #[test]
        fn any_read_size_reassembles(
            payloads in proptest::collection::vec(proptest::collection::vec(proptest::num::u8::ANY, 0..5000), 1..4),
            max_per_read in 1usize..6000,
            chunk in 1usize..4096,
        ) {
            let mut wire = Vec::new();
            for payload in &payloads {
                wire.extend(framed(payload));
            }

            let framer = Framer::new(FramerConfig { read_chunk_size: chunk, ..FramerConfig::default() });
            let mut reader = Trickle::new(&wire, max_per_read);

            for payload in &payloads {
                let received = framer.receive(&mut reader).unwrap().unwrap();
                proptest::prop_assert_eq!(&received[..], &payload[..]);
            }
            proptest::prop_assert_eq!(framer.receive(&mut reader).unwrap(), None);
            proptest::prop_assert!(reader.requests.iter().all(|&n| n <= chunk.max(8)));
        }
    }
}
