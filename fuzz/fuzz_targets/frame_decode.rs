//! Feed arbitrary bytes through the incremental decoder in arbitrary slices.
//!
//! Checks that decoding never panics, never consumes more than it was given,
//! and that every frame it produces re-encodes to the bytes it consumed.

#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use qsct_proto::{DecodeState, Frame, FrameDecoder};

const MAX_PAYLOAD: u64 = 4096;

fuzz_target!(|data: &[u8]| {
    let Some((&step, mut input)) = data.split_first() else {
        return;
    };
    let step = usize::from(step).max(1);

    let mut decoder = FrameDecoder::new(MAX_PAYLOAD, 512);
    let mut consumed = BytesMut::new();

    while !input.is_empty() {
        let slice = &input[..input.len().min(step).min(decoder.wants().max(1))];
        let used = decoder.feed(slice);
        assert!(used <= slice.len());
        consumed.extend_from_slice(&slice[..used]);
        input = &input[used..];

        if decoder.state() == DecodeState::Complete {
            match decoder.take() {
                Some(Ok(frame)) => {
                    assert_eq!(frame.to_bytes(), consumed.split().freeze());
                    let _ = Frame::decode(&frame.to_bytes());
                },
                Some(Err(_)) => consumed.clear(),
                None => unreachable!("complete decoder always holds a result"),
            }
        } else if used == 0 {
            unreachable!("decoder stalled in {:?}", decoder.state());
        }
    }

    let _ = decoder.stream_end();
});
