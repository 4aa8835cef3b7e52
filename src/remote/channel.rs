//! [`RemoteStatePort`] over any [`StreamTransport`].
//!
//! One `poll` performs at most one bounded transport read.  A single read
//! can complete several frames; decoded results are queued and handed out
//! one per `poll`, oldest first.  Decoding pauses while the queue is full
//! and the unread bytes wait in the read buffer, so no complete frame is
//! ever dropped for lack of room.
//!
//! Resubscribing reopens the stream and discards any partial frame, but
//! change events already received stay queued so none is lost when the
//! loop resubscribes after every delivered event.  Queued errors belong to
//! the old stream and are dropped.

use core::fmt::Write as _;
use core::ops::{ControlFlow, Range};

use heapless::Deque;
use log::{debug, info};

use super::event::{decode_frame, scalar_value, ChangeEvent};
use super::sse::SseDecoder;
use super::transport::StreamTransport;
use crate::app::ports::RemoteStatePort;
use crate::error::ChannelError;

/// Bytes pulled from the transport per poll.
const READ_CHUNK: usize = 256;

/// Decoded results waiting to be polled.
const PENDING_CAP: usize = 16;

/// Largest REST value body accepted by [`fetch_int`](RemoteStatePort::fetch_int).
const VALUE_BODY_CAP: usize = 64;

pub struct StreamChannel<T> {
    transport: T,
    decoder: SseDecoder,
    pending: Deque<Result<ChangeEvent, ChannelError>, PENDING_CAP>,
    open: bool,
    buf: [u8; READ_CHUNK],
    /// Part of `buf` not yet fed to the decoder.
    unread: Range<usize>,
    /// The stream was reopened while `unread` still held bytes of the old
    /// one; the decoder restarts once they are used up.
    reopened: bool,
}

impl<T: StreamTransport> StreamChannel<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            decoder: SseDecoder::new(),
            pending: Deque::new(),
            open: false,
            buf: [0; READ_CHUNK],
            unread: 0..0,
            reopened: false,
        }
    }

    /// Whether a stream is currently open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Decode buffered bytes, reading once from the transport when none
    /// are left.  Called only with an empty queue.
    fn fill(&mut self) -> Result<(), ChannelError> {
        if self.unread.is_empty() {
            if self.reopened {
                self.decoder.reset();
                self.reopened = false;
            }
            if !self.open {
                return Ok(());
            }
            match self.transport.read(&mut self.buf) {
                Ok(n) => self.unread = 0..n,
                Err(e) => {
                    self.open = false;
                    self.transport.close_stream();
                    return Err(e);
                }
            }
        }

        let pending = &mut self.pending;
        let used = self.decoder.feed_until(&self.buf[self.unread.clone()], |frame| {
            if let Some(res) = decode_frame(frame) {
                // Never full here: decoding stops as soon as it fills up.
                let _ = pending.push_back(res);
                if pending.is_full() {
                    return ControlFlow::Break(());
                }
            }
            ControlFlow::Continue(())
        });
        self.unread.start += used;
        Ok(())
    }
}

impl<T: StreamTransport> RemoteStatePort for StreamChannel<T> {
    fn subscribe(&mut self, path: &str) -> Result<(), ChannelError> {
        self.transport.close_stream();
        self.open = false;
        if self.unread.is_empty() {
            self.decoder.reset();
        } else {
            self.reopened = true;
        }

        let mut kept = Deque::new();
        while let Some(item) = self.pending.pop_front() {
            if item.is_ok() {
                let _ = kept.push_back(item);
            }
        }
        self.pending = kept;

        self.transport.open_stream(path)?;
        self.open = true;
        debug!("channel: stream open on '{}'", path);
        Ok(())
    }

    fn poll(&mut self) -> Option<Result<ChangeEvent, ChannelError>> {
        if self.pending.is_empty() {
            if let Err(e) = self.fill() {
                return Some(Err(e));
            }
        }
        self.pending.pop_front()
    }

    fn fetch_int(&mut self, path: &str) -> Result<i32, ChannelError> {
        let mut body = [0u8; VALUE_BODY_CAP];
        let n = self.transport.get(path, &mut body)?;
        let value: serde_json::Value =
            serde_json::from_slice(&body[..n]).map_err(|_| ChannelError::Malformed)?;
        let v = scalar_value(&value).ok_or(ChannelError::Malformed)?;
        info!("channel: '{}' = {}", path, v);
        Ok(v)
    }

    fn set_float(&mut self, path: &str, value: f32) -> Result<(), ChannelError> {
        if !value.is_finite() {
            return Err(ChannelError::Malformed);
        }
        let mut body: heapless::String<32> = heapless::String::new();
        write!(body, "{value}").map_err(|_| ChannelError::Malformed)?;
        self.transport.put(path, body.as_bytes())
    }
}
