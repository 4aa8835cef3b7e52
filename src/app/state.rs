//! In-memory mirror of the remote store plus the latest sensor values.
//!
//! Nothing here is authoritative: actuator values live in the remote store
//! and are only cached for the display and for idempotence checks.

use core::fmt::Write as _;

use crate::registry::{value_means_on, ActuatorId};

/// Rows on the status display.
pub const STATUS_ROWS: usize = 4;

/// One rendered display row.
pub type StatusLine = heapless::String<24>;

/// Stored value meaning "off" under the inverted convention.
pub const VALUE_OFF: i32 = 1;

/// Last known values, owned by the loop.
#[derive(Debug, Clone, PartialEq)]
pub struct MirroredState {
    actuators: [i32; ActuatorId::COUNT],
    temperature: f32,
    humidity: f32,
}

impl Default for MirroredState {
    fn default() -> Self {
        Self {
            actuators: [VALUE_OFF; ActuatorId::COUNT],
            temperature: 0.0,
            humidity: 0.0,
        }
    }
}

impl MirroredState {
    pub fn set_actuator(&mut self, id: ActuatorId, value: i32) {
        self.actuators[id.index()] = value;
    }

    pub fn actuator(&self, id: ActuatorId) -> i32 {
        self.actuators[id.index()]
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn humidity(&self) -> f32 {
        self.humidity
    }

    /// Copy over the valid fields of `reading`.  Returns which fields were
    /// taken as `(temperature, humidity)`.
    pub fn apply_reading(&mut self, reading: &Reading) -> (bool, bool) {
        if reading.valid_temp {
            self.temperature = reading.temperature;
        }
        if reading.valid_humid {
            self.humidity = reading.humidity;
        }
        (reading.valid_temp, reading.valid_humid)
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            led: self.actuator(ActuatorId::Bulb),
            power: self.actuator(ActuatorId::PowerOutlet),
            temperature: self.temperature,
            humidity: self.humidity,
        }
    }
}

/// One sensor sample.  Each field may be independently invalid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reading {
    pub temperature: f32,
    pub humidity: f32,
    pub valid_temp: bool,
    pub valid_humid: bool,
}

impl Reading {
    /// Build from raw optional reads; NaN and infinities count as invalid.
    pub fn from_parts(temperature: Option<f32>, humidity: Option<f32>) -> Self {
        let t = temperature.filter(|v| v.is_finite());
        let h = humidity.filter(|v| v.is_finite());
        Self {
            temperature: t.unwrap_or(0.0),
            humidity: h.unwrap_or(0.0),
            valid_temp: t.is_some(),
            valid_humid: h.is_some(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.valid_temp && self.valid_humid
    }
}

/// What the display shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSnapshot {
    pub led: i32,
    pub power: i32,
    pub temperature: f32,
    pub humidity: f32,
}

impl StatusSnapshot {
    /// Format the four display rows.
    pub fn lines(&self) -> [StatusLine; STATUS_ROWS] {
        let mut rows: [StatusLine; STATUS_ROWS] = Default::default();
        // Row widths are bounded well below capacity; a failed write only
        // truncates the row.
        let _ = write!(rows[0], "{}: {}", ActuatorId::Bulb.label(), on_off(self.led));
        let _ = write!(rows[1], "{}: {}", ActuatorId::PowerOutlet.label(), on_off(self.power));
        let _ = write!(rows[2], "Temp: {:.2}", self.temperature);
        let _ = write!(rows[3], "Humid: {:.2}", self.humidity);
        rows
    }
}

fn on_off(value: i32) -> &'static str {
    if value_means_on(value) { "ON" } else { "OFF" }
}
