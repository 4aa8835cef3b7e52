//! Remote desired-state store boundary.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                    Remote state stack                      │
//! │                                                            │
//! │  ┌────────────────┐   ┌────────────┐   ┌───────────────┐   │
//! │  │ StreamTransport│──▶│ SseDecoder │──▶│ decode_frame  │   │
//! │  │ (bytes)        │   │ (framing)  │   │ → ChangeEvent │   │
//! │  └────────────────┘   └────────────┘   └───────┬───────┘   │
//! │                                                │           │
//! │                          StreamChannel ◀───────┘           │
//! │                   (impl RemoteStatePort)                   │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Payloads are decoded exactly once, here.  Everything above this module
//! sees typed [`ChangeEvent`]s and [`ChannelError`](crate::error::ChannelError)s.

pub mod channel;
pub mod event;
pub mod sse;
pub mod transport;

pub use channel::StreamChannel;
pub use event::{ChangeEvent, EventKind};

/// Write-only path for the published temperature.
pub const TEMPERATURE_PATH: &str = "/Temperature";
/// Write-only path for the published relative humidity.
pub const HUMIDITY_PATH: &str = "/Humidity";
