//! Blocking request client.
//!
//! Used by `qsct send`. Runs on plain threads over a `std::net::TcpStream`
//! wrapped in a [`qsct_core::Channel`], independent of any async runtime.

use std::{io::Write, net::TcpStream};

use bytes::Bytes;
use qsct_core::{Channel, ChannelConfig};
use tracing::debug;

use crate::error::{Result, ServerError};

/// Send each message as one request and collect the replies in order.
pub fn request_all<'a, I>(addr: &str, messages: I, config: ChannelConfig) -> Result<Vec<Bytes>>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let stream = TcpStream::connect(addr)?;
    stream.set_nodelay(true)?;
    debug!(%addr, "connected");

    let channel = Channel::from_connection(stream, config)?;
    let mut replies = Vec::new();

    for (index, message) in messages.into_iter().enumerate() {
        let reply = channel.request_bytes(message)?.ok_or(ServerError::NoReply { index })?;
        replies.push(reply);
    }

    Ok(replies)
}

/// Write each reply on its own line, lossily decoded as UTF-8.
pub fn write_replies<W: Write>(out: &mut W, replies: &[Bytes]) -> std::io::Result<()> {
    for reply in replies {
        writeln!(out, "{}", String::from_utf8_lossy(reply))?;
    }
    out.flush()
}
