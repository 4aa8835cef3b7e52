//! GPIO / peripheral pin assignments for the RoomLink controller board
//! (ESP32-WROOM DevKit).
//!
//! Single source of truth: `main` builds every pin driver from this module
//! rather than hard-coding pin numbers.  Each number is claimed exactly once.

// ---------------------------------------------------------------------------
// Actuators
// ---------------------------------------------------------------------------

/// Relay driving the bulb.  Active LOW.
pub const BULB_GPIO: i32 = 26;
/// Relay driving the AC outlet.  Active LOW.
pub const POWER_AC_GPIO: i32 = 27;
/// Indicator LED next to the AC outlet.  Active HIGH.
pub const POWER_AC_LED_GPIO: i32 = 25;

/// Board LED lit once start-up completes.  Active LOW (sinks current).
pub const READY_LED_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// DHT11 single-wire data line (open-drain, external 10 kΩ pull-up).
pub const DHT_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// I²C bus (SSD1306 OLED)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;
pub const I2C_BAUD_HZ: u32 = 400_000;

/// 7-bit address of the OLED (SA0 tied low).
pub const OLED_I2C_ADDR: u8 = 0x3C;
