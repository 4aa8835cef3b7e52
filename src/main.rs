//! RoomLink Firmware: Main Entry Point
//!
//! Hexagonal architecture around a single cooperative control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter    StreamChannel<FirebaseTransport>           │
//! │  (DHT11 + OLED)     (RemoteStatePort)                          │
//! │  LogEventSink       Esp32TimeAdapter     WifiAdapter           │
//! │  (EventSink)        (TimePort)           (bring-up)            │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │         ReconciliationLoop (pure logic)                │    │
//! │  │  ActuatorRegistry · PeriodicTimer · UpdateThrottle     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::Result;
use embedded_hal::digital::OutputPin;
use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, Output, PinDriver, Pull};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{error, info, warn};

use roomlink::adapters::display::OledStatusDisplay;
use roomlink::adapters::firebase::FirebaseTransport;
use roomlink::adapters::hardware::HardwareAdapter;
use roomlink::adapters::log_sink::LogEventSink;
use roomlink::adapters::time::Esp32TimeAdapter;
use roomlink::adapters::wifi::WifiAdapter;
use roomlink::app::ports::{DisplayPort, SensorPort};
use roomlink::app::service::{ReconciliationLoop, INIT_NOTICE};
use roomlink::config::SystemConfig;
use roomlink::drivers::Ssd1306;
use roomlink::pins;
use roomlink::registry::{ActuatorId, ActuatorPort, ActuatorRegistry, Binding, Polarity};
use roomlink::remote::transport::{NullTransport, StreamTransport};
use roomlink::remote::StreamChannel;
use roomlink::sensors::Dht11;

type OutPin = PinDriver<'static, AnyOutputPin, Output>;

/// Claim a push-pull output by GPIO number.
fn output(gpio: i32) -> Result<OutPin> {
    // SAFETY: every GPIO number in `pins` is claimed exactly once, here.
    let pin = unsafe { AnyOutputPin::new(gpio) };
    Ok(PinDriver::output(pin)?)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  RoomLink v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = SystemConfig::from_build_env();
    config.validate()?;

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let mut clock = Esp32TimeAdapter::new();

    // ── 2. Outputs first: relays to their safe level ─────────
    let registry = ActuatorRegistry::new([
        Binding::new(
            ActuatorId::Bulb,
            ActuatorPort::new("bulb", output(pins::BULB_GPIO)?, Polarity::ActiveLow),
            None,
        ),
        Binding::new(
            ActuatorId::PowerOutlet,
            ActuatorPort::new("power-ac", output(pins::POWER_AC_GPIO)?, Polarity::ActiveLow),
            Some(ActuatorPort::new(
                "power-ac-led",
                output(pins::POWER_AC_LED_GPIO)?,
                Polarity::ActiveHigh,
            )),
        ),
    ]);
    let ready = ActuatorPort::new("ready-led", output(pins::READY_LED_GPIO)?, Polarity::ActiveLow);

    // ── 3. Display + sensor ───────────────────────────────────
    // SAFETY: SDA, SCL and the DHT line are claimed once each.
    let (sda, scl, dht_gpio) = unsafe {
        (
            AnyIOPin::new(pins::I2C_SDA_GPIO),
            AnyIOPin::new(pins::I2C_SCL_GPIO),
            AnyIOPin::new(pins::DHT_GPIO),
        )
    };
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        sda,
        scl,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_BAUD_HZ)),
    )?;
    let display = OledStatusDisplay::new(Ssd1306::new(i2c, pins::OLED_I2C_ADDR))?;

    let mut dht_pin = PinDriver::input_output_od(dht_gpio)?;
    dht_pin.set_pull(Pull::Up)?;
    let mut hw = HardwareAdapter::new(Dht11::new(dht_pin, Ets), display);
    hw.notice(INIT_NOTICE);

    // ── 4. WiFi ───────────────────────────────────────────────
    let wifi_driver = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?,
        sysloop,
    )?;
    let mut wifi = WifiAdapter::new(wifi_driver);
    if config.wifi_ssid.is_empty() {
        warn!("WiFi: no credentials compiled in, running offline");
    } else {
        wifi.set_credentials(&config.wifi_ssid, &config.wifi_password)?;
        if let Err(e) = wifi.connect(&mut clock) {
            // The loop keeps resubscribing; the display and sensor still work.
            error!("WiFi: {}", e);
        }
    }

    // ── 5. Control loop ───────────────────────────────────────
    if config.has_remote() {
        let transport = FirebaseTransport::new(&config);
        run(config, transport, hw, clock, registry, ready)
    } else {
        warn!("Remote: no host configured, local-only mode");
        run(config, NullTransport, hw, clock, registry, ready)
    }
}

fn run<T, H, P>(
    config: SystemConfig,
    transport: T,
    hw: H,
    clock: Esp32TimeAdapter,
    registry: ActuatorRegistry<P>,
    ready: ActuatorPort<P>,
) -> !
where
    T: StreamTransport,
    H: SensorPort + DisplayPort,
    P: OutputPin,
{
    let mut sink = LogEventSink::new();
    let mut control = ReconciliationLoop::new(config, StreamChannel::new(transport), hw, clock, registry)
        .with_ready_indicator(ready);
    control.start(&mut sink);
    loop {
        control.tick(&mut sink);
    }
}
