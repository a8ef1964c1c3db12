//! Command-line arguments for the `qsct` binary.

use std::time::Duration;

use clap::{Parser, Subcommand};
use qsct_core::{ChannelConfig, FramerConfig};
use qsct_proto::{DEFAULT_MAX_PAYLOAD_SIZE, DEFAULT_READ_CHUNK_SIZE};

use crate::server::ServerConfig;

/// Default address for both serving and sending.
pub const DEFAULT_ADDR: &str = "127.0.0.1:7878";

/// Length-prefixed framing over TCP.
#[derive(Debug, Parser)]
#[command(name = "qsct", version, about)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// `qsct` subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run an echo server.
    Serve {
        /// Address to listen on.
        #[arg(long, default_value = DEFAULT_ADDR)]
        bind: String,

        /// Largest accepted payload in bytes.
        #[arg(long, default_value_t = DEFAULT_MAX_PAYLOAD_SIZE)]
        max_payload: u64,

        /// Largest single read while receiving a payload.
        #[arg(long, default_value_t = DEFAULT_READ_CHUNK_SIZE)]
        chunk_size: usize,
    },

    /// Send each message as a request and print the replies.
    Send {
        /// Server address.
        #[arg(long, default_value = DEFAULT_ADDR)]
        addr: String,

        /// Give up waiting for a channel lock after this many milliseconds.
        #[arg(long)]
        lock_timeout_ms: Option<u64>,

        /// Messages to send, one frame each.
        #[arg(required = true)]
        messages: Vec<String>,
    },
}

impl Command {
    /// Server configuration for `serve`, default otherwise.
    pub fn server_config(&self) -> ServerConfig {
        match self {
            Self::Serve { max_payload, chunk_size, .. } => ServerConfig {
                channel: ChannelConfig {
                    framer: FramerConfig {
                        max_payload_size: *max_payload,
                        read_chunk_size: *chunk_size,
                    },
                    lock_timeout: None,
                },
            },
            Self::Send { .. } => ServerConfig::default(),
        }
    }

    /// Channel configuration for `send`, default otherwise.
    pub fn channel_config(&self) -> ChannelConfig {
        match self {
            Self::Send { lock_timeout_ms, .. } => ChannelConfig {
                lock_timeout: lock_timeout_ms.map(Duration::from_millis),
                ..ChannelConfig::default()
            },
            Self::Serve { .. } => self.server_config().channel,
        }
    }
}
