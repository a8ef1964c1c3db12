//! End-to-end tests over real loopback TCP.
//!
//! The async server runs on its own tokio runtime thread; clients use the
//! blocking `Channel` from plain threads, the way `qsct send` does.

use std::{net::TcpStream, sync::mpsc, thread};

use qsct_core::{Channel, ChannelConfig, FrameError, FramerConfig};
use qsct_proto::ProtocolError;
use qsct_server::{EchoHandler, Server, ServerConfig, ServerError, TcpTransport, client};

/// Start an echo server on an ephemeral port and return its address.
fn spawn_server(config: ServerConfig) -> String {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().expect("runtime");
        runtime.block_on(async move {
            let transport = TcpTransport::bind("127.0.0.1:0").await.expect("bind");
            let addr = transport.local_addr().expect("bound").expect("local addr");
            tx.send(addr.to_string()).expect("report address");
            let _ = Server::new(EchoHandler, config).run(transport).await;
        });
    });

    rx.recv().expect("server address")
}

#[test]
fn request_all_echoes_in_order() {
    let addr = spawn_server(ServerConfig::default());
    let messages: [&[u8]; 3] = [b"alpha", b"", b"gamma"];

    let replies = client::request_all(&addr, messages, ChannelConfig::default()).unwrap();
    let replies: Vec<&[u8]> = replies.iter().map(|b| &b[..]).collect();
    assert_eq!(replies, messages);
}

#[test]
fn large_payloads_cross_chunk_boundaries() {
    let addr = spawn_server(ServerConfig::default());
    let stream = TcpStream::connect(&addr).unwrap();
    let channel = Channel::from_connection(stream, ChannelConfig::default()).unwrap();

    for len in [4095usize, 4096, 4097, 100_000] {
        let payload: Vec<u8> = (0..len).map(|i| (i % 241) as u8).collect();
        let reply = channel.request_bytes(&payload).unwrap().unwrap();
        assert_eq!(&reply[..], &payload[..], "payload of {len} bytes");
    }
}

#[test]
fn concurrent_requests_pair_with_their_replies() {
    let addr = spawn_server(ServerConfig::default());
    let stream = TcpStream::connect(&addr).unwrap();
    let channel = Channel::from_connection(stream, ChannelConfig::default()).unwrap();

    thread::scope(|scope| {
        for worker in 0..8u32 {
            let channel = &channel;
            scope.spawn(move || {
                for seq in 0..25u32 {
                    let request = format!("worker {worker} request {seq}");
                    let reply = channel.request_bytes(request.as_bytes()).unwrap().unwrap();
                    assert_eq!(&reply[..], request.as_bytes());
                }
            });
        }
    });
}

#[test]
fn oversized_request_is_skipped_not_fatal() {
    let config = ServerConfig {
        channel: ChannelConfig {
            framer: FramerConfig { max_payload_size: 16, ..FramerConfig::default() },
            lock_timeout: None,
        },
    };
    let addr = spawn_server(config);
    let stream = TcpStream::connect(&addr).unwrap();
    let channel = Channel::from_connection(stream, ChannelConfig::default()).unwrap();

    // the server drains the oversized frame without replying
    channel.send_bytes(&[0u8; 64]).unwrap();
    let reply = channel.request_bytes(b"small").unwrap();
    assert_eq!(reply.as_deref(), Some(&b"small"[..]));
}

#[test]
fn client_limit_rejects_before_sending() {
    let addr = spawn_server(ServerConfig::default());
    let config = ChannelConfig {
        framer: FramerConfig { max_payload_size: 2, ..FramerConfig::default() },
        lock_timeout: None,
    };
    let messages: [&[u8]; 1] = [b"abc"];

    let err = client::request_all(&addr, messages, config).unwrap_err();
    assert!(matches!(
        err,
        ServerError::Frame(FrameError::Protocol(ProtocolError::PayloadTooLarge { size: 3, limit: 2 }))
    ));
}
