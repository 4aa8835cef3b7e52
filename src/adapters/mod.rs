//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements                | Connects to                 |
//! |-------------|---------------------------|-----------------------------|
//! | `display`   | DisplayPort               | SSD1306 OLED over I²C       |
//! | `firebase`  | StreamTransport           | HTTPS REST + event stream   |
//! | `hardware`  | SensorPort + DisplayPort  | DHT11 + OLED                |
//! | `log_sink`  | EventSink                 | Serial log output           |
//! | `time`      | TimePort                  | ESP32 system timer          |
//! | `wifi`      | (bring-up only)           | ESP-IDF WiFi STA            |

pub mod display;
pub mod firebase;
pub mod hardware;
pub mod log_sink;
pub mod time;
pub mod wifi;
