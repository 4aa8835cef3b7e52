//! Mock adapters for integration tests.
//!
//! Every mock records what the loop did to it so tests can assert on the
//! full history without real GPIO, I²C or network.

use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use roomlink::app::events::AppEvent;
use roomlink::app::ports::{DisplayPort, EventSink, RemoteStatePort, SensorPort, TimePort};
use roomlink::app::service::ReconciliationLoop;
use roomlink::app::state::{StatusLine, STATUS_ROWS};
use roomlink::config::SystemConfig;
use roomlink::error::ChannelError;
use roomlink::registry::{ActuatorId, ActuatorPort, ActuatorRegistry, Binding, Polarity};
use roomlink::remote::ChangeEvent;

// ── MockPin ───────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockPin {
    /// Electrical level; `None` until first written.
    pub high: Option<bool>,
    pub writes: u32,
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.high = Some(false);
        self.writes += 1;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.high = Some(true);
        self.writes += 1;
        Ok(())
    }
}

// ── MockRemote ────────────────────────────────────────────────

/// Scripted remote store.
#[derive(Default)]
pub struct MockRemote {
    /// Returned by successive `poll` calls; `None` once empty.
    pub script: VecDeque<Result<ChangeEvent, ChannelError>>,
    /// Returned by successive `subscribe` calls; `Ok` once empty.
    pub subscribe_results: VecDeque<Result<(), ChannelError>>,
    pub subscribes: Vec<String>,
    pub polls: u32,
    pub stored: HashMap<String, i32>,
    pub floats: Vec<(String, f32)>,
}

#[allow(dead_code)]
impl MockRemote {
    pub fn with_events(events: impl IntoIterator<Item = Result<ChangeEvent, ChannelError>>) -> Self {
        Self {
            script: events.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn push(&mut self, ev: ChangeEvent) {
        self.script.push_back(Ok(ev));
    }

    pub fn fail_next_poll(&mut self, e: ChannelError) {
        self.script.push_front(Err(e));
    }
}

impl RemoteStatePort for MockRemote {
    fn subscribe(&mut self, path: &str) -> Result<(), ChannelError> {
        self.subscribes.push(path.to_string());
        self.subscribe_results.pop_front().unwrap_or(Ok(()))
    }

    fn poll(&mut self) -> Option<Result<ChangeEvent, ChannelError>> {
        self.polls += 1;
        self.script.pop_front()
    }

    fn fetch_int(&mut self, path: &str) -> Result<i32, ChannelError> {
        self.stored.get(path).copied().ok_or(ChannelError::Http(404))
    }

    fn set_float(&mut self, path: &str, value: f32) -> Result<(), ChannelError> {
        self.floats.push((path.to_string(), value));
        Ok(())
    }
}

// ── MockBoard (sensor + display) ──────────────────────────────

pub struct MockBoard {
    /// Next temperature reads; `fallback_temp` once empty.
    pub temps: VecDeque<Option<f32>>,
    pub humids: VecDeque<Option<f32>>,
    pub fallback_temp: Option<f32>,
    pub fallback_humid: Option<f32>,
    pub samples: u32,
    pub frames: Vec<[String; STATUS_ROWS]>,
    pub notices: Vec<String>,
}

impl Default for MockBoard {
    fn default() -> Self {
        Self {
            temps: VecDeque::new(),
            humids: VecDeque::new(),
            fallback_temp: Some(21.0),
            fallback_humid: Some(45.0),
            samples: 0,
            frames: Vec::new(),
            notices: Vec::new(),
        }
    }
}

#[allow(dead_code)]
impl MockBoard {
    pub fn last_frame(&self) -> &[String; STATUS_ROWS] {
        self.frames.last().expect("nothing rendered yet")
    }
}

impl SensorPort for MockBoard {
    fn read_temperature(&mut self) -> Option<f32> {
        self.samples += 1;
        self.temps.pop_front().unwrap_or(self.fallback_temp)
    }

    fn read_humidity(&mut self) -> Option<f32> {
        self.humids.pop_front().unwrap_or(self.fallback_humid)
    }
}

impl DisplayPort for MockBoard {
    fn render(&mut self, lines: &[StatusLine; STATUS_ROWS]) {
        self.frames.push(lines.clone().map(|l| l.as_str().to_string()));
    }

    fn notice(&mut self, text: &str) {
        self.notices.push(text.to_string());
    }
}

// ── FakeClock ─────────────────────────────────────────────────

/// Simulated clock: only delays advance time.
#[derive(Debug, Default)]
pub struct FakeClock {
    pub now: u64,
    pub delays: Vec<u32>,
}

impl TimePort for FakeClock {
    fn now_ms(&self) -> u64 {
        self.now
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
        self.now += u64::from(ms);
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Wiring helpers ────────────────────────────────────────────

pub type TestLoop = ReconciliationLoop<MockRemote, MockBoard, FakeClock, MockPin>;

pub fn registry() -> ActuatorRegistry<MockPin> {
    ActuatorRegistry::new([
        Binding::new(
            ActuatorId::Bulb,
            ActuatorPort::new("bulb", MockPin::default(), Polarity::ActiveLow),
            None,
        ),
        Binding::new(
            ActuatorId::PowerOutlet,
            ActuatorPort::new("power-ac", MockPin::default(), Polarity::ActiveLow),
            Some(ActuatorPort::new("power-ac-led", MockPin::default(), Polarity::ActiveHigh)),
        ),
    ])
}

#[allow(dead_code)]
pub fn build(config: SystemConfig, remote: MockRemote) -> TestLoop {
    ReconciliationLoop::new(config, remote, MockBoard::default(), FakeClock::default(), registry())
}

/// Build and start with default config.
#[allow(dead_code)]
pub fn started(remote: MockRemote) -> (TestLoop, RecordingSink) {
    let mut lp = build(SystemConfig::default(), remote);
    let mut sink = RecordingSink::new();
    lp.start(&mut sink);
    (lp, sink)
}

/// Electrical level of the primary output of `id`.
#[allow(dead_code)]
pub fn primary_level(lp: &TestLoop, id: ActuatorId) -> Option<bool> {
    lp.registry().binding(id).primary.pin().high
}

#[allow(dead_code)]
pub fn indicator_level(lp: &TestLoop, id: ActuatorId) -> Option<bool> {
    lp.registry().binding(id).indicator.as_ref().and_then(|i| i.pin().high)
}
