//! System configuration parameters
//!
//! All tunable parameters for the RoomLink controller.  Credentials are baked
//! in at build time from environment variables; everything else has a
//! compiled-in default.  There is no persistent config store.

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Network ---
    /// WiFi station SSID
    pub wifi_ssid: String<32>,
    /// WiFi station password (empty = open network)
    pub wifi_password: String<64>,
    /// Remote state store host, e.g. `my-project.firebaseio.com`
    pub remote_host: String<96>,
    /// Remote store auth token / database secret
    pub remote_auth: String<64>,
    /// Subscription root; `/` watches every child path
    pub stream_path: String<32>,

    // --- Timing ---
    /// Cooperative yield at the end of every tick (milliseconds)
    pub loop_tick_ms: u32,
    /// Sensor sampling interval (milliseconds)
    pub sensor_interval_ms: u32,
    /// Pause before resubscribing after a channel failure (milliseconds)
    pub resubscribe_backoff_ms: u32,
    /// Upper bound on opening the stream: connect, TLS handshake and
    /// response headers (milliseconds)
    pub stream_connect_timeout_ms: u32,
    /// Upper bound on a single stream read once the stream is open
    /// (milliseconds)
    pub stream_read_timeout_ms: u32,

    // --- Remote push ---
    /// Number of sensor samples between pushes of the readings
    pub publish_every_samples: u32,
    /// Whether the push hook actually transmits
    pub publish_readings: bool,

    // --- Stream cadence ---
    /// Reopen the stream after every delivered change event
    pub resubscribe_after_event: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: String::new(),
            wifi_password: String::new(),
            remote_host: String::new(),
            remote_auth: String::new(),
            stream_path: fixed("/"),

            loop_tick_ms: 10,
            sensor_interval_ms: 2_000,
            resubscribe_backoff_ms: 1_000,
            stream_connect_timeout_ms: 10_000,
            stream_read_timeout_ms: 20,

            publish_every_samples: 15, // ~30 s at the default sensor interval
            publish_readings: false,

            resubscribe_after_event: true,
        }
    }
}

impl SystemConfig {
    /// Defaults plus credentials taken from the build environment
    /// (`ROOMLINK_WIFI_SSID`, `ROOMLINK_WIFI_PASSWORD`,
    /// `ROOMLINK_REMOTE_HOST`, `ROOMLINK_REMOTE_AUTH`).
    pub fn from_build_env() -> Self {
        Self {
            wifi_ssid: fixed(option_env!("ROOMLINK_WIFI_SSID").unwrap_or("")),
            wifi_password: fixed(option_env!("ROOMLINK_WIFI_PASSWORD").unwrap_or("")),
            remote_host: fixed(option_env!("ROOMLINK_REMOTE_HOST").unwrap_or("")),
            remote_auth: fixed(option_env!("ROOMLINK_REMOTE_AUTH").unwrap_or("")),
            ..Self::default()
        }
    }

    /// Whether a remote store has been configured at all.
    pub fn has_remote(&self) -> bool {
        !self.remote_host.is_empty()
    }

    /// Range-check the timing and cadence parameters.
    pub fn validate(&self) -> Result<()> {
        if self.loop_tick_ms == 0 {
            return Err(Error::Config("loop_tick_ms must be non-zero"));
        }
        if u64::from(self.loop_tick_ms) * 100 > u64::from(self.sensor_interval_ms) {
            return Err(Error::Config(
                "loop_tick_ms must be at least 100x shorter than sensor_interval_ms",
            ));
        }
        if self.publish_every_samples == 0 {
            return Err(Error::Config("publish_every_samples must be non-zero"));
        }
        if self.resubscribe_backoff_ms <= self.loop_tick_ms {
            return Err(Error::Config("resubscribe_backoff_ms must exceed loop_tick_ms"));
        }
        if self.stream_read_timeout_ms == 0 {
            return Err(Error::Config("stream_read_timeout_ms must be non-zero"));
        }
        // A read runs inside a tick; opening the stream runs on a recovery tick.
        if self.stream_read_timeout_ms > self.loop_tick_ms.saturating_mul(10) {
            return Err(Error::Config(
                "stream_read_timeout_ms must be at most 10x loop_tick_ms",
            ));
        }
        if self.stream_connect_timeout_ms < 1_000 {
            return Err(Error::Config("stream_connect_timeout_ms must be at least 1000"));
        }
        if self.stream_connect_timeout_ms <= self.stream_read_timeout_ms {
            return Err(Error::Config(
                "stream_connect_timeout_ms must exceed stream_read_timeout_ms",
            ));
        }
        if !self.stream_path.starts_with('/') {
            return Err(Error::Config("stream_path must start with '/'"));
        }
        Ok(())
    }
}

/// Copy `s` into a fixed-capacity string, truncating at a char boundary.
fn fixed<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
