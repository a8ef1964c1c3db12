//! Blocking stream abstraction.
//!
//! A connection is modelled as two halves so the send side and the receive
//! side can be guarded independently. Anything implementing
//! [`std::io::Write`] is a [`SendStream`] and anything implementing
//! [`std::io::Read`] is a [`RecvStream`], which covers sockets, pipes, and
//! in-memory buffers without adapters.

use std::{
    io::{self, Read, Write},
    net::TcpStream,
};

/// Outbound half of a byte stream.
pub trait SendStream {
    /// Hand all of `data` to the stream, blocking until it is accepted.
    fn send(&mut self, data: &[u8]) -> io::Result<()>;

    /// Push buffered bytes towards the peer.
    fn flush(&mut self) -> io::Result<()>;
}

/// Inbound half of a byte stream.
pub trait RecvStream {
    /// Read up to `buf.len()` bytes, blocking until at least one byte arrives
    /// or the stream closes. Returns `0` only on close.
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<W: Write + ?Sized> SendStream for W {
    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        self.write_all(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(self)
    }
}

impl<R: Read + ?Sized> RecvStream for R {
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf)
    }
}

/// A duplex connection that can be split into independently owned halves.
pub trait StreamConnection: Sized {
    /// Outbound half.
    type Send: SendStream + Send;

    /// Inbound half.
    type Recv: RecvStream + Send;

    /// Split into send and receive halves that refer to the same connection.
    fn split(self) -> io::Result<(Self::Send, Self::Recv)>;
}

impl StreamConnection for TcpStream {
    type Send = TcpStream;
    type Recv = TcpStream;

    fn split(self) -> io::Result<(Self::Send, Self::Recv)> {
        let recv = self.try_clone()?;
        Ok((self, recv))
    }
}

#[cfg(unix)]
impl StreamConnection for std::os::unix::net::UnixStream {
    type Send = Self;
    type Recv = Self;

    fn split(self) -> io::Result<(Self::Send, Self::Recv)> {
        let recv = self.try_clone()?;
        Ok((self, recv))
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;

    #[test]
    fn tcp_halves_share_the_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let client = TcpStream::connect(addr).unwrap();
        let (mut server, _) = listener.accept().unwrap();

        let (mut send, mut recv) = client.split().unwrap();
        send.send(b"ping").unwrap();

        let mut buf = [0u8; 4];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");

        server.write_all(b"pong").unwrap();
        let mut buf = [0u8; 4];
        let mut filled = 0;
        while filled < 4 {
            filled += recv.recv(&mut buf[filled..]).unwrap();
        }
        assert_eq!(&buf, b"pong");
    }

    #[test]
    fn slices_and_vecs_are_streams() {
        let mut out = Vec::new();
        out.send(b"abc").unwrap();
        assert_eq!(out, b"abc");

        let mut input: &[u8] = b"xyz";
        let mut buf = [0u8; 8];
        assert_eq!(input.recv(&mut buf).unwrap(), 3);
        assert_eq!(input.recv(&mut buf).unwrap(), 0);
    }
}
