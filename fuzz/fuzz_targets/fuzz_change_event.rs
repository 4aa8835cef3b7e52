//! Fuzz target: change-event decoding
//!
//! Treats the input as `event\0data` and runs it through `decode_frame`,
//! asserting that it never panics, paths stay within the fixed buffer, and
//! only `Put` events carry a value.
//!
//! cargo fuzz run fuzz_change_event

#![no_main]

use libfuzzer_sys::fuzz_target;
use roomlink::remote::event::{MAX_PATH_LEN, decode_frame};
use roomlink::remote::sse::SseFrame;
use roomlink::remote::EventKind;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let (event, payload) = text.split_once('\0').unwrap_or(("put", text));
    let Some(frame) = SseFrame::new(event, payload) else {
        return;
    };

    if let Some(Ok(ev)) = decode_frame(&frame) {
        assert!(ev.path.len() <= MAX_PATH_LEN);
        if ev.kind != EventKind::Put {
            assert_eq!(ev.value, 0, "non-put event carries a value");
        }
    }
});
