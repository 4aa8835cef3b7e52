//! Fuzz target: `SseDecoder::feed`
//!
//! Drives arbitrary byte sequences into the event-stream framer, split at a
//! fuzzer-chosen point, and asserts that it never panics, never yields
//! payloads beyond its fixed buffers, and produces the same frames whether
//! the input arrives whole, in two reads, or one frame at a time through
//! `feed_until`.
//!
//! cargo fuzz run fuzz_sse_decoder

#![no_main]

use std::ops::ControlFlow;

use libfuzzer_sys::fuzz_target;
use roomlink::remote::sse::{MAX_DATA_LEN, SseDecoder, SseFrame};

fn decode(chunks: &[&[u8]]) -> Vec<SseFrame> {
    let mut decoder = SseDecoder::new();
    let mut frames = Vec::new();
    for chunk in chunks {
        decoder.feed(chunk, |f| frames.push(f.clone()));
    }
    frames
}

fuzz_target!(|data: &[u8]| {
    let Some((&split, body)) = data.split_first() else {
        return;
    };
    let at = usize::from(split) % (body.len() + 1);

    let whole = decode(&[body]);
    for frame in &whole {
        assert!(frame.data().len() <= MAX_DATA_LEN, "payload exceeds buffer");
    }

    let (a, b) = body.split_at(at);
    assert_eq!(decode(&[a, b]), whole, "chunk boundary changed the frames");

    let mut decoder = SseDecoder::new();
    let mut stepped = Vec::new();
    let mut rest = body;
    while !rest.is_empty() {
        let used = decoder.feed_until(rest, |f| {
            stepped.push(f.clone());
            ControlFlow::Break(())
        });
        rest = &rest[used..];
    }
    assert_eq!(stepped, whole, "pausing after each frame changed the frames");

    // After a reset the decoder must accept bytes cleanly again.
    let mut decoder = SseDecoder::new();
    decoder.feed(a, |_| {});
    decoder.reset();
    let mut again = Vec::new();
    decoder.feed(b"event: put\ndata: {}\n\n", |f| again.push(f.clone()));
    assert_eq!(again.len(), 1);
});
