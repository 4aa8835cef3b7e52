//! Hardware adapter: bridges the board peripherals to domain port traits.
//!
//! Owns the DHT11 and the OLED, exposing them through [`SensorPort`] and
//! [`DisplayPort`].  Actuator GPIOs are not here: they are owned by the
//! [`ActuatorRegistry`](crate::registry::ActuatorRegistry).

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::i2c::I2c;
use log::debug;

use super::display::OledStatusDisplay;
use crate::app::ports::{DisplayPort, SensorPort};
use crate::app::state::{Reading, StatusLine, STATUS_ROWS};
use crate::error::SensorFault;
use crate::sensors::{Dht11, DhtFrame};

/// Concrete adapter that combines sensor and display behind port traits.
pub struct HardwareAdapter<P, D, I> {
    dht: Dht11<P, D>,
    display: OledStatusDisplay<I>,
    last_fault: Option<SensorFault>,
}

impl<P, D, I> HardwareAdapter<P, D, I>
where
    P: InputPin + OutputPin,
    D: DelayNs,
    I: I2c,
{
    pub fn new(dht: Dht11<P, D>, display: OledStatusDisplay<I>) -> Self {
        Self {
            dht,
            display,
            last_fault: None,
        }
    }

    /// Fault from the most recent failed transaction, cleared on success.
    pub fn last_fault(&self) -> Option<SensorFault> {
        self.last_fault
    }

    fn transact(&mut self) -> Option<DhtFrame> {
        match self.dht.read() {
            Ok(frame) => {
                self.last_fault = None;
                Some(frame)
            }
            Err(e) => {
                debug!("DHT11: {}", e);
                self.last_fault = Some(e);
                None
            }
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<P, D, I> SensorPort for HardwareAdapter<P, D, I>
where
    P: InputPin + OutputPin,
    D: DelayNs,
    I: I2c,
{
    fn read_temperature(&mut self) -> Option<f32> {
        self.transact().map(|f| f.temperature_c())
    }

    fn read_humidity(&mut self) -> Option<f32> {
        self.transact().map(|f| f.humidity_pct())
    }

    /// One transaction yields both quantities; the DHT11 cannot be read
    /// twice in quick succession.
    fn sample(&mut self) -> Reading {
        let frame = self.transact();
        Reading::from_parts(
            frame.map(|f| f.temperature_c()),
            frame.map(|f| f.humidity_pct()),
        )
    }
}

// ── DisplayPort implementation ────────────────────────────────

impl<P, D, I> DisplayPort for HardwareAdapter<P, D, I>
where
    P: InputPin + OutputPin,
    D: DelayNs,
    I: I2c,
{
    fn render(&mut self, lines: &[StatusLine; STATUS_ROWS]) {
        self.display.render(lines);
    }

    fn notice(&mut self, text: &str) {
        self.display.notice(text);
    }
}
