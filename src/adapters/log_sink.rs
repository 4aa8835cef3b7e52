//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! Unrecognised remote events stay at `trace` level; they are expected
//! traffic, not errors.

use log::{debug, error, info, trace, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => info!("START | loop running"),
            AppEvent::InitialFetchFailed { id, error } => {
                warn!("INIT  | {} unreadable ({}), keeping OFF", id.path(), error);
            }
            AppEvent::Subscribed => info!("SUB   | stream open"),
            AppEvent::SubscribeFailed(e) => error!("SUB   | failed: {}", e),
            AppEvent::ChannelFailed(e) => error!("CHAN  | {}", e),
            AppEvent::Resubscribing { attempt } => info!("SUB   | retry #{}", attempt),
            AppEvent::ActuatorApplied {
                id,
                value,
                on,
                changed,
            } => info!(
                "APPLY | {} = {} -> {}{}",
                id.path(),
                value,
                if *on { "ON" } else { "OFF" },
                if *changed { "" } else { " (no change)" }
            ),
            AppEvent::EventIgnored(reason) => trace!("EVENT | ignored ({:?})", reason),
            AppEvent::SensorSampled(r) => debug!(
                "SENSE | T={:.1}\u{00b0}C{} RH={:.1}%{}",
                r.temperature,
                if r.valid_temp { "" } else { "(invalid)" },
                r.humidity,
                if r.valid_humid { "" } else { "(invalid)" },
            ),
            AppEvent::SensorFault {
                temperature,
                humidity,
            } => {
                if *temperature {
                    warn!("SENSE | error reading temperature");
                }
                if *humidity {
                    warn!("SENSE | error reading humidity");
                }
            }
            AppEvent::PublishHook { transmitted } => {
                if *transmitted {
                    debug!("PUSH  | readings sent");
                } else {
                    trace!("PUSH  | hook (not transmitted)");
                }
            }
        }
    }
}
