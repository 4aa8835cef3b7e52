//! Server-sent-events line framer.
//!
//! Wire format:
//! ```text
//! event: put\n
//! data: {"path":"/LedStatus","data":0}\n
//! \n                                  ← blank line dispatches the frame
//! ```
//!
//! Lines end in LF, CRLF or a lone CR.  The decoder accumulates incoming
//! bytes into fixed buffers and yields complete frames.  This handles
//! partial reads gracefully: a single transport read may return part of a
//! line, several lines, or several frames concatenated.  Lines or payloads
//! that exceed the buffers are dropped whole rather than truncated.

use core::ops::ControlFlow;

use log::debug;

/// Longest accepted line, field name included.
pub const MAX_LINE_LEN: usize = 512;

/// Largest accepted `data` payload per frame.
pub const MAX_DATA_LEN: usize = 512;

const MAX_EVENT_NAME_LEN: usize = 24;

/// One dispatched frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    event: heapless::String<MAX_EVENT_NAME_LEN>,
    data: heapless::String<MAX_DATA_LEN>,
}

impl SseFrame {
    /// Build a frame directly.  `None` if either part exceeds its buffer.
    pub fn new(event: &str, data: &str) -> Option<Self> {
        Some(Self {
            event: heapless::String::try_from(event).ok()?,
            data: heapless::String::try_from(data).ok()?,
        })
    }

    /// Event name; `"message"` when the frame carried no `event:` field.
    pub fn event(&self) -> &str {
        if self.event.is_empty() {
            "message"
        } else {
            &self.event
        }
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    fn is_empty(&self) -> bool {
        self.event.is_empty() && self.data.is_empty()
    }

    fn clear(&mut self) {
        self.event.clear();
        self.data.clear();
    }
}

/// Streaming SSE decoder.
pub struct SseDecoder {
    line: heapless::Vec<u8, MAX_LINE_LEN>,
    /// Current line overflowed; discard bytes until the next newline.
    line_overflow: bool,
    frame: SseFrame,
    /// Current frame overflowed; drop it at dispatch.
    frame_overflow: bool,
    /// Last byte was a CR, so an LF right after it is not a new line.
    after_cr: bool,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self {
            line: heapless::Vec::new(),
            line_overflow: false,
            frame: SseFrame::default(),
            frame_overflow: false,
            after_cr: false,
        }
    }

    /// Feed bytes into the decoder, calling `on_frame` for every frame
    /// completed by them.  Returns the number of frames dispatched.
    pub fn feed(&mut self, data: &[u8], mut on_frame: impl FnMut(&SseFrame)) -> usize {
        let mut dispatched = 0;
        self.feed_until(data, |frame| {
            on_frame(frame);
            dispatched += 1;
            ControlFlow::Continue(())
        });
        dispatched
    }

    /// Like [`feed`](Self::feed), but stops right after a frame for which
    /// `on_frame` breaks.  Returns how many bytes of `data` were consumed;
    /// the rest has not been seen by the decoder.
    pub fn feed_until(
        &mut self,
        data: &[u8],
        mut on_frame: impl FnMut(&SseFrame) -> ControlFlow<()>,
    ) -> usize {
        for (i, &byte) in data.iter().enumerate() {
            if self.push_byte(byte, &mut on_frame).is_break() {
                return i + 1;
            }
        }
        data.len()
    }

    /// Drop any partial line and frame (e.g. after reopening the stream).
    pub fn reset(&mut self) {
        self.line.clear();
        self.line_overflow = false;
        self.frame.clear();
        self.frame_overflow = false;
        self.after_cr = false;
    }

    fn push_byte(
        &mut self,
        byte: u8,
        on_frame: &mut impl FnMut(&SseFrame) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        let after_cr = core::mem::replace(&mut self.after_cr, false);
        match byte {
            b'\n' if after_cr => return ControlFlow::Continue(()),
            b'\r' => self.after_cr = true,
            b'\n' => {}
            _ => {
                if !self.line_overflow && self.line.push(byte).is_err() {
                    debug!("sse: line exceeds {} bytes, dropping", MAX_LINE_LEN);
                    self.line_overflow = true;
                    self.frame_overflow = true;
                }
                return ControlFlow::Continue(());
            }
        }

        if self.line_overflow {
            self.line_overflow = false;
            self.line.clear();
            return ControlFlow::Continue(());
        }

        let flow = if self.line.is_empty() {
            self.dispatch(on_frame)
        } else {
            self.process_line();
            ControlFlow::Continue(())
        };
        self.line.clear();
        flow
    }

    fn process_line(&mut self) {
        let Ok(line) = core::str::from_utf8(&self.line) else {
            debug!("sse: non-UTF-8 line ignored");
            return;
        };
        if line.starts_with(':') {
            return; // comment
        }
        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };
        match field {
            "event" => {
                self.frame.event.clear();
                if self.frame.event.push_str(value).is_err() {
                    self.frame_overflow = true;
                }
            }
            "data" => {
                let sep_ok = self.frame.data.is_empty() || self.frame.data.push('\n').is_ok();
                if !sep_ok || self.frame.data.push_str(value).is_err() {
                    self.frame_overflow = true;
                }
            }
            _ => {} // id / retry / unknown fields carry nothing we use
        }
    }

    fn dispatch(&mut self, on_frame: &mut impl FnMut(&SseFrame) -> ControlFlow<()>) -> ControlFlow<()> {
        let flow = if self.frame_overflow {
            debug!("sse: oversized frame '{}' dropped", self.frame.event());
            ControlFlow::Continue(())
        } else if self.frame.is_empty() {
            ControlFlow::Continue(())
        } else {
            on_frame(&self.frame)
        };
        self.frame.clear();
        self.frame_overflow = false;
        flow
    }
}
