//! DHT11 temperature / humidity sensor on a single open-drain wire.
//!
//! ```text
//!  host:   ‾‾‾‾\_________18 ms_________/‾‾‾‾ (released, pulled up)
//!  sensor:                                  \__80 µs__/‾‾80 µs‾‾\  40 bits  \_50_/‾‾
//!  bit:    \__50 µs__/‾‾ 26 µs ‾‾\  = 0       \__50 µs__/‾‾‾‾ 70 µs ‾‾‾‾\  = 1
//! ```
//!
//! Bits are classified by comparing each high pulse with the low pulse in
//! front of it, so the decoder does not depend on an accurate µs clock.
//! Payload is 5 bytes: RH int, RH dec, T int, T dec (bit 7 = negative),
//! checksum.
//!
//! ## Dual-target design
//!
//! Generic over `embedded-hal` pins and delays.  On ESP-IDF the pin is an
//! open-drain `PinDriver` and the delay is `Ets`; tests drive it with a
//! scripted waveform.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::SensorFault;

/// Host start pulse.
const START_LOW_MS: u32 = 18;

/// Longest accepted pulse of any kind, in polling steps of 1 µs.
const PULSE_TIMEOUT_US: u32 = 200;

const DATA_BITS: usize = 40;

/// One checksummed sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DhtFrame {
    bytes: [u8; 5],
}

impl DhtFrame {
    /// Validate the checksum of a raw 5-byte payload.
    pub fn decode(bytes: [u8; 5]) -> Result<Self, SensorFault> {
        let sum = bytes[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
        if sum != bytes[4] {
            return Err(SensorFault::Checksum);
        }
        Ok(Self { bytes })
    }

    pub fn humidity_pct(&self) -> f32 {
        f32::from(self.bytes[0]) + f32::from(self.bytes[1]) * 0.1
    }

    pub fn temperature_c(&self) -> f32 {
        let magnitude = f32::from(self.bytes[2]) + f32::from(self.bytes[3] & 0x7F) * 0.1;
        if self.bytes[3] & 0x80 != 0 {
            -magnitude
        } else {
            magnitude
        }
    }

    pub fn raw(&self) -> [u8; 5] {
        self.bytes
    }
}

pub struct Dht11<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> Dht11<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// `pin` must be open-drain with a pull-up; it is released immediately.
    pub fn new(mut pin: P, delay: D) -> Self {
        let _ = pin.set_high();
        Self { pin, delay }
    }

    /// Run one full transaction.  Takes ~23 ms.  The sensor needs at least
    /// one second between transactions.
    pub fn read(&mut self) -> Result<DhtFrame, SensorFault> {
        self.pin.set_low().map_err(|_| SensorFault::Bus)?;
        self.delay.delay_ms(START_LOW_MS);
        self.pin.set_high().map_err(|_| SensorFault::Bus)?;

        // Released line until the sensor answers, then its 80/80 µs response.
        self.pulse(true)?;
        self.pulse(false)?;
        self.pulse(true)?;

        let mut bytes = [0u8; 5];
        for i in 0..DATA_BITS {
            let low = self.pulse(false)?;
            let high = self.pulse(true)?;
            if high > low {
                bytes[i / 8] |= 0x80 >> (i % 8);
            }
        }
        DhtFrame::decode(bytes)
    }

    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }

    /// Length of the current pulse at `level`, in polling steps.
    fn pulse(&mut self, level: bool) -> Result<u32, SensorFault> {
        let mut steps = 0;
        while self.pin.is_high().map_err(|_| SensorFault::Bus)? == level {
            if steps >= PULSE_TIMEOUT_US {
                return Err(SensorFault::Timeout);
            }
            self.delay.delay_us(1);
            steps += 1;
        }
        Ok(steps)
    }
}
