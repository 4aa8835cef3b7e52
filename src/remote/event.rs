//! Typed change events and their decoding from stream frames.
//!
//! Stream frames arrive as `event: <name>` + `data: <json>`.  The JSON body
//! of `put` / `patch` frames is `{"path": "/LedStatus", "data": 0}`.
//!
//! | Frame name     | Result                                        |
//! |----------------|-----------------------------------------------|
//! | `put`          | `Put` if `data` is a scalar, else `Other`     |
//! | `patch`        | `Other`                                       |
//! | `keep-alive`   | nothing                                       |
//! | `cancel`       | `Err(ChannelError::Cancelled)`                |
//! | `auth_revoked` | `Err(ChannelError::AuthRevoked)`              |
//! | anything else  | `Other`                                       |

use serde::Deserialize;
use serde_json::Value;

use super::sse::SseFrame;
use crate::error::ChannelError;

/// Longest remote path carried in an event.  Longer paths cannot name a
/// known actuator and decode as `Other` with an empty path.
pub const MAX_PATH_LEN: usize = 64;

pub type RemotePath = heapless::String<MAX_PATH_LEN>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A value was written at `path`.
    Put,
    /// Any other notification (patch, deletion, non-scalar write, unknown).
    Other,
}

/// One remote mutation notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: EventKind,
    pub path: RemotePath,
    pub value: i32,
}

impl ChangeEvent {
    pub fn put(path: &str, value: i32) -> Self {
        match RemotePath::try_from(path) {
            Ok(path) => Self {
                kind: EventKind::Put,
                path,
                value,
            },
            Err(()) => Self::other(""),
        }
    }

    pub fn other(path: &str) -> Self {
        Self {
            kind: EventKind::Other,
            path: RemotePath::try_from(path).unwrap_or_default(),
            value: 0,
        }
    }
}

#[derive(Deserialize)]
struct Payload {
    path: String,
    #[serde(default)]
    data: Value,
}

/// Decode one frame.  `None` means the frame carries no change notification.
pub fn decode_frame(frame: &SseFrame) -> Option<Result<ChangeEvent, ChannelError>> {
    match frame.event() {
        "put" => Some(Ok(decode_put(frame.data()))),
        "patch" => Some(Ok(match serde_json::from_str::<Payload>(frame.data()) {
            Ok(p) => ChangeEvent::other(&p.path),
            Err(_) => ChangeEvent::other(""),
        })),
        "keep-alive" => None,
        "cancel" => Some(Err(ChannelError::Cancelled)),
        "auth_revoked" => Some(Err(ChannelError::AuthRevoked)),
        _ => Some(Ok(ChangeEvent::other(""))),
    }
}

fn decode_put(data: &str) -> ChangeEvent {
    let Ok(payload) = serde_json::from_str::<Payload>(data) else {
        return ChangeEvent::other("");
    };
    match scalar_value(&payload.data) {
        Some(v) => ChangeEvent::put(&payload.path, v),
        // null (deletion), objects and arrays carry no single value.
        None => ChangeEvent::other(&payload.path),
    }
}

/// Interpret a JSON scalar as the integer convention used by the store.
pub fn scalar_value(data: &Value) -> Option<i32> {
    match data {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i32::try_from(i).unwrap_or(if i < 0 { i32::MIN } else { i32::MAX })),
            None => n.as_f64().filter(|f| f.is_finite()).map(|f| f as i32),
        },
        Value::Bool(b) => Some(i32::from(*b)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
