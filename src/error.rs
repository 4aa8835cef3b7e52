//! Unified error types for the RoomLink firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! bootstrap path's error handling uniform.  All variants are `Copy` so they
//! can be stored in loop state (e.g. `ChannelState::Failed`) without
//! allocation.
//!
//! None of these errors is fatal once the reconciliation loop is running:
//! the loop folds them into state and keeps ticking.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The remote state channel failed.
    Channel(ChannelError),
    /// A sensor could not produce a valid reading.
    Sensor(SensorFault),
    /// The display bus rejected a transfer.
    Display,
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(e) => write!(f, "channel: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Display => write!(f, "display: bus transfer failed"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Channel errors
// ---------------------------------------------------------------------------

/// Failures of the remote state subscription.  Every variant is recovered by
/// resubscribing after a bounded backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    /// No stream is open (subscribe was never called or was torn down).
    NotConnected,
    /// Connect, read or write failed at the transport layer.
    Transport,
    /// The server ended the event stream.
    StreamClosed,
    /// The server cancelled the subscription (permission change).
    Cancelled,
    /// The auth token expired or was revoked.
    AuthRevoked,
    /// Non-success HTTP status on connect or REST access.
    Http(u16),
    /// A REST response body could not be decoded.
    Malformed,
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected"),
            Self::Transport => write!(f, "transport failure"),
            Self::StreamClosed => write!(f, "stream closed by server"),
            Self::Cancelled => write!(f, "subscription cancelled"),
            Self::AuthRevoked => write!(f, "auth revoked"),
            Self::Http(status) => write!(f, "HTTP status {status}"),
            Self::Malformed => write!(f, "malformed response"),
        }
    }
}

impl From<ChannelError> for Error {
    fn from(e: ChannelError) -> Self {
        Self::Channel(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor faults
// ---------------------------------------------------------------------------

/// Transient sensor faults.  The affected field keeps its previous value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorFault {
    /// The sensor did not answer within its protocol window.
    Timeout,
    /// Frame checksum mismatch.
    Checksum,
    /// The GPIO line could not be driven or sampled.
    Bus,
    /// The driver produced NaN.
    NotANumber,
}

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "sensor timeout"),
            Self::Checksum => write!(f, "checksum mismatch"),
            Self::Bus => write!(f, "GPIO bus error"),
            Self::NotANumber => write!(f, "reading is NaN"),
        }
    }
}

impl From<SensorFault> for Error {
    fn from(e: SensorFault) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
