//! Outbound application events.
//!
//! The [`ReconciliationLoop`](super::service::ReconciliationLoop) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on the
//! other side decide what to do with them (serial log, test recorder).

use super::state::Reading;
use crate::error::ChannelError;
use crate::registry::{ActuatorId, IgnoreReason};

/// Structured events emitted by the control loop.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Init finished; the loop is about to run.
    Started,

    /// A stored actuator value could not be read at startup.
    InitialFetchFailed { id: ActuatorId, error: ChannelError },

    /// The change stream is open.
    Subscribed,

    /// Opening the change stream failed.
    SubscribeFailed(ChannelError),

    /// The open stream reported a failure.
    ChannelFailed(ChannelError),

    /// About to retry the subscription after a failure.
    Resubscribing { attempt: u32 },

    /// A recognised change was applied to an actuator.
    ActuatorApplied {
        id: ActuatorId,
        value: i32,
        on: bool,
        changed: bool,
    },

    /// A change notification had no effect.
    EventIgnored(IgnoreReason),

    /// A sensor sample was taken (fields may be individually invalid).
    SensorSampled(Reading),

    /// One or both sensor quantities were unreadable.
    SensorFault { temperature: bool, humidity: bool },

    /// The update throttle wrapped.  `transmitted` is false while pushing
    /// readings is disabled.
    PublishHook { transmitted: bool },
}
