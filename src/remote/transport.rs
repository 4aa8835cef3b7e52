//! Transport abstraction for the remote store.
//!
//! Concrete implementations:
//! - HTTPS REST + event-stream over WiFi (`adapters::firebase`)
//! - [`NullTransport`] when no remote store is configured
//!
//! [`StreamChannel`](super::StreamChannel) is generic over
//! `StreamTransport`, so swapping the backend requires zero changes to the
//! decoding or reconciliation logic.

use crate::error::ChannelError;

/// Byte-oriented access to the remote store.
pub trait StreamTransport {
    /// Open (or reopen) the change stream rooted at `path`.
    fn open_stream(&mut self, path: &str) -> Result<(), ChannelError>;

    /// Read up to `buf.len()` bytes of the open stream.
    ///
    /// Must return within a short, bounded time.  `Ok(0)` means nothing is
    /// pending; end of stream is reported as `Err(ChannelError::StreamClosed)`.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ChannelError>;

    /// Tear down the stream, if open.
    fn close_stream(&mut self);

    /// Fetch the JSON value stored at `path` into `buf`.  Returns its length.
    fn get(&mut self, path: &str, buf: &mut [u8]) -> Result<usize, ChannelError>;

    /// Overwrite the value at `path` with the JSON document `body`.
    fn put(&mut self, path: &str, body: &[u8]) -> Result<(), ChannelError>;
}

/// A transport with no remote behind it: the stream opens but never
/// delivers, reads of stored values fail, and writes are discarded.
///
/// Lets the controller run purely locally (sensor + display) when no
/// remote store is configured.
pub struct NullTransport;

impl StreamTransport for NullTransport {
    fn open_stream(&mut self, _path: &str) -> Result<(), ChannelError> {
        Ok(())
    }

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, ChannelError> {
        Ok(0)
    }

    fn close_stream(&mut self) {}

    fn get(&mut self, _path: &str, _buf: &mut [u8]) -> Result<usize, ChannelError> {
        Err(ChannelError::NotConnected)
    }

    fn put(&mut self, _path: &str, _body: &[u8]) -> Result<(), ChannelError> {
        Ok(())
    }
}
