//! Port traits: the hexagonal boundary between the control loop and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ReconciliationLoop (domain)
//! ```
//!
//! Driven adapters (remote store, sensor, display, clock, event sinks)
//! implement these traits.  The [`ReconciliationLoop`](super::service::ReconciliationLoop)
//! consumes them via generics, so the domain core never touches hardware
//! or the network directly.
//!
//! Every method here returns promptly.  Blocking I/O is the adapter's
//! problem and must stay bounded well below one loop tick.

use super::events::AppEvent;
use super::state::{Reading, StatusLine, STATUS_ROWS};
use crate::error::ChannelError;
use crate::remote::ChangeEvent;

// ───────────────────────────────────────────────────────────────
// Remote state port (driven adapter: remote store ↔ domain)
// ───────────────────────────────────────────────────────────────

/// Subscription to the remote desired-state store.
pub trait RemoteStatePort {
    /// Establish (or re-establish) interest in every change under `path`.
    ///
    /// Any previous subscription is torn down first.  Changes it already
    /// delivered in full stay pending; a half-received one is dropped.
    fn subscribe(&mut self, path: &str) -> Result<(), ChannelError>;

    /// Non-blocking poll for the next change.
    ///
    /// `None` when nothing is pending.  After `Some(Err(_))` the channel is
    /// unusable until the next successful [`subscribe`](Self::subscribe).
    fn poll(&mut self) -> Option<Result<ChangeEvent, ChannelError>>;

    /// Read the integer currently stored at `path`.
    fn fetch_int(&mut self, path: &str) -> Result<i32, ChannelError>;

    /// Overwrite the value at `path` with a float.
    fn set_float(&mut self, path: &str, value: f32) -> Result<(), ChannelError>;
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Temperature / humidity source.  `None` (or NaN) signals a transient
/// fault on that one quantity.
pub trait SensorPort {
    fn read_temperature(&mut self) -> Option<f32>;

    fn read_humidity(&mut self) -> Option<f32>;

    /// Take one combined sample.
    fn sample(&mut self) -> Reading {
        let t = self.read_temperature();
        let h = self.read_humidity();
        Reading::from_parts(t, h)
    }
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → screen)
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget status display.
pub trait DisplayPort {
    /// Show the four status rows.
    fn render(&mut self, lines: &[StatusLine; STATUS_ROWS]);

    /// Show a single free-form message (boot progress).
    fn notice(&mut self, text: &str);
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Monotonic clock and cooperative delay.
pub trait TimePort {
    /// Milliseconds since an arbitrary fixed origin.  Never goes backwards.
    fn now_ms(&self) -> u64;

    /// Yield for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.  Adapters
/// decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}
