//! Blocking in-memory pipes with controllable read chunking.
//!
//! Real sockets deliver bytes in whatever slices the network produces. These
//! pipes make that slicing explicit and reproducible: the reader never returns
//! more than its [`ChunkPolicy`] allows, regardless of how much was written or
//! how much the caller asked for.
//!
//! Dropping a [`PipeWriter`] closes the pipe; the reader drains what is
//! buffered and then reads `0`. Dropping a [`PipeReader`] makes later writes
//! fail with [`io::ErrorKind::BrokenPipe`].

use std::{
    collections::VecDeque,
    io::{self, Read, Write},
    sync::Arc,
};

use parking_lot::{Condvar, Mutex};
use qsct_core::{Channel, ChannelConfig, StreamConnection};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// How a [`PipeReader`] slices buffered bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkPolicy {
    /// Everything requested, up to what is buffered.
    Whole,
    /// At most this many bytes per read (zero behaves as one).
    Fixed(usize),
    /// A uniformly random `1..=max` bytes per read, reproducible from `seed`.
    Random {
        /// RNG seed.
        seed: u64,
        /// Largest slice.
        max: usize,
    },
}

#[derive(Debug, Default)]
struct State {
    buf: VecDeque<u8>,
    writer_closed: bool,
    reader_closed: bool,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<State>,
    readable: Condvar,
}

/// Write end of a pipe.
#[derive(Debug)]
pub struct PipeWriter {
    shared: Arc<Shared>,
}

/// Read end of a pipe.
#[derive(Debug)]
pub struct PipeReader {
    shared: Arc<Shared>,
    policy: ChunkPolicy,
    rng: ChaCha8Rng,
}

/// One side of a [`duplex`] pair.
#[derive(Debug)]
pub struct PipeEnd {
    /// Bytes written here arrive at the peer's reader.
    pub writer: PipeWriter,
    /// Bytes the peer writes arrive here.
    pub reader: PipeReader,
}

/// Unidirectional pipe whose reader follows `policy`.
pub fn pipe(policy: ChunkPolicy) -> (PipeWriter, PipeReader) {
    let shared = Arc::new(Shared::default());
    let seed = match policy {
        ChunkPolicy::Random { seed, .. } => seed,
        ChunkPolicy::Whole | ChunkPolicy::Fixed(_) => 0,
    };

    let writer = PipeWriter { shared: Arc::clone(&shared) };
    let reader = PipeReader { shared, policy, rng: ChaCha8Rng::seed_from_u64(seed) };
    (writer, reader)
}

/// Connected pair of duplex ends; both directions follow `policy`.
pub fn duplex(policy: ChunkPolicy) -> (PipeEnd, PipeEnd) {
    let (a_writer, b_reader) = pipe(policy);
    let (b_writer, a_reader) = pipe(policy);
    (PipeEnd { writer: a_writer, reader: a_reader }, PipeEnd { writer: b_writer, reader: b_reader })
}

/// Two channels talking to each other over a [`duplex`] pair.
pub fn loopback_channels(
    policy: ChunkPolicy,
    config: ChannelConfig,
) -> (Channel<PipeWriter, PipeReader>, Channel<PipeWriter, PipeReader>) {
    let (a, b) = duplex(policy);
    (
        Channel::with_config(a.writer, a.reader, config),
        Channel::with_config(b.writer, b.reader, config),
    )
}

impl PipeReader {
    fn next_limit(&mut self) -> usize {
        match self.policy {
            ChunkPolicy::Whole => usize::MAX,
            ChunkPolicy::Fixed(n) => n.max(1),
            ChunkPolicy::Random { max, .. } => self.rng.gen_range(1..=max.max(1)),
        }
    }
}

impl Read for PipeReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        let limit = self.next_limit();

        let mut state = self.shared.state.lock();
        while state.buf.is_empty() && !state.writer_closed {
            self.shared.readable.wait(&mut state);
        }

        let n = out.len().min(limit).min(state.buf.len());
        for (dst, byte) in out[..n].iter_mut().zip(state.buf.drain(..n)) {
            *dst = byte;
        }
        Ok(n)
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        self.shared.state.lock().reader_closed = true;
    }
}

impl Write for PipeWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut state = self.shared.state.lock();
        if state.reader_closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe reader dropped"));
        }
        state.buf.extend(data);
        self.shared.readable.notify_all();
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        self.shared.state.lock().writer_closed = true;
        self.shared.readable.notify_all();
    }
}

impl StreamConnection for PipeEnd {
    type Send = PipeWriter;
    type Recv = PipeReader;

    fn split(self) -> io::Result<(Self::Send, Self::Recv)> {
        Ok((self.writer, self.reader))
    }
}
