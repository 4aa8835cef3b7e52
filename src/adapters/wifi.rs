//! WiFi station-mode adapter.
//!
//! Brings the station interface up before the loop starts.  The remote
//! store is unreachable without it, so bring-up retries with a bounded
//! backoff; once the loop runs, stream failures are handled by
//! resubscribing rather than here.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stub for host-side tests.

use core::fmt;
use log::{error, info, warn};

use crate::app::ports::TimePort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

impl core::error::Error for ConnectivityError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

const INITIAL_BACKOFF_MS: u32 = 2_000;
const MAX_BACKOFF_MS: u32 = 16_000;

/// Connection attempts before bring-up gives up.
pub const MAX_ATTEMPTS: u32 = 6;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

pub fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Platform driver
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub type WifiDriver = esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>;

/// Host stand-in for the radio: fails the first `fail_first` attempts.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct WifiDriver {
    pub fail_first: u32,
    pub attempts: u32,
    connected: bool,
}

#[cfg(not(target_os = "espidf"))]
impl WifiDriver {
    pub fn failing(fail_first: u32) -> Self {
        Self {
            fail_first,
            ..Self::default()
        }
    }
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    driver: WifiDriver,
}

impl WifiAdapter {
    pub fn new(driver: WifiDriver) -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            driver,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn driver(&self) -> &WifiDriver {
        &self.driver
    }

    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password.push_str(password).map_err(|_| ConnectivityError::InvalidPassword)?;
        info!("WiFi: credentials set (SSID='{}')", self.ssid);
        Ok(())
    }

    /// Connect, retrying up to [`MAX_ATTEMPTS`] times with doubling backoff
    /// (2 s → 4 s → … capped at 16 s).
    pub fn connect(&mut self, clock: &mut impl TimePort) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        if self.state == WifiState::Connected {
            return Ok(());
        }

        info!("WiFi: connecting to '{}'", self.ssid);
        let mut backoff = INITIAL_BACKOFF_MS;
        for attempt in 1..=MAX_ATTEMPTS {
            self.state = WifiState::Connecting;
            match self.platform_connect() {
                Ok(()) => {
                    self.state = WifiState::Connected;
                    info!("WiFi: connected (attempt {})", attempt);
                    return Ok(());
                }
                Err(e) if attempt < MAX_ATTEMPTS => {
                    warn!("WiFi: attempt {} failed ({}), retrying in {} ms", attempt, e, backoff);
                    clock.delay_ms(backoff);
                    backoff = (backoff * 2).min(MAX_BACKOFF_MS);
                }
                Err(e) => {
                    error!("WiFi: giving up after {} attempts: {}", attempt, e);
                }
            }
        }
        self.state = WifiState::Failed;
        Err(ConnectivityError::ConnectionFailed)
    }

    pub fn is_connected(&self) -> bool {
        self.state == WifiState::Connected && self.platform_is_connected()
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let cfg = Configuration::Client(ClientConfiguration {
            ssid: self.ssid.as_str().try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method: if self.password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        });
        self.driver
            .set_configuration(&cfg)
            .map_err(|_| ConnectivityError::ConnectionFailed)?;
        if !self.driver.is_started().unwrap_or(false) {
            self.driver.start().map_err(|_| ConnectivityError::ConnectionFailed)?;
        }
        self.driver.connect().map_err(|_| ConnectivityError::ConnectionFailed)?;
        self.driver
            .wait_netif_up()
            .map_err(|_| ConnectivityError::ConnectionFailed)?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        self.driver.attempts += 1;
        if self.driver.attempts <= self.driver.fail_first {
            return Err(ConnectivityError::ConnectionFailed);
        }
        self.driver.connected = true;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.driver.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.driver.connected
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
