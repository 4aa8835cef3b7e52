//! Reconciliation loop: the hexagonal core.
//!
//! [`ReconciliationLoop`] owns the actuator registry, the mirrored state
//! and every timer.  All I/O flows through port traits held by the loop,
//! making the whole thing testable with mock adapters.
//!
//! ```text
//!  RemoteStatePort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                      │    ReconciliationLoop     │
//!       SensorPort ──▶ │ registry · timers · state │ ──▶ DisplayPort
//!                      └────────────┬─────────────┘
//!                                   ▼
//!                             ActuatorPort(s)
//! ```
//!
//! One [`tick`](ReconciliationLoop::tick) runs, in this order and never
//! interleaved:
//!
//! 1. channel recovery (only when the channel has failed; skips 2 and 3)
//! 2. at most one change event
//! 3. the sensor timer and the update throttle
//! 4. display refresh
//! 5. cooperative yield of `loop_tick_ms`

use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::config::SystemConfig;
use crate::error::ChannelError;
use crate::registry::{ActuatorId, ActuatorPort, ActuatorRegistry, ApplyOutcome};
use crate::remote::{ChangeEvent, HUMIDITY_PATH, TEMPERATURE_PATH};
use crate::scheduler::{PeriodicTimer, UpdateThrottle};

use super::events::AppEvent;
use super::ports::{DisplayPort, EventSink, RemoteStatePort, SensorPort, TimePort};
use super::state::{MirroredState, StatusSnapshot};

/// Shown while the initial state is fetched.
pub const INIT_NOTICE: &str = "Initializing...";

/// Where the loop is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    /// Constructed, [`start`](ReconciliationLoop::start) not yet finished.
    Init,
    /// A subscription is being opened.
    Connecting,
    /// Streaming with nothing to do.
    SubscribedIdle,
    /// A change event was delivered this tick.
    ProcessingEvent,
    /// The channel failed; the next tick backs off and resubscribes.
    ResubscribeWait,
}

/// Lifecycle of the remote subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Subscribing,
    Streaming,
    Failed(ChannelError),
}

/// Running counters, for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub ticks: u64,
    pub events_applied: u64,
    pub events_ignored: u64,
    pub channel_failures: u64,
    pub subscribe_attempts: u64,
    pub samples: u64,
    pub publish_hook_calls: u64,
}

/// The control loop.
///
/// * `R`: remote desired-state store
/// * `H`: board I/O: sensor plus display
/// * `C`: clock
/// * `P`: GPIO output pin type shared by every actuator
pub struct ReconciliationLoop<R, H, C, P> {
    config: SystemConfig,
    remote: R,
    hw: H,
    clock: C,
    registry: ActuatorRegistry<P>,
    ready: Option<ActuatorPort<P>>,
    mirrored: MirroredState,
    channel: ChannelState,
    phase: LoopPhase,
    sensor_timer: PeriodicTimer,
    publish_throttle: UpdateThrottle,
    stats: LoopStats,
    /// Consecutive resubscription attempts since the last success.
    retry_attempt: u32,
}

impl<R, H, C, P> ReconciliationLoop<R, H, C, P>
where
    R: RemoteStatePort,
    H: SensorPort + DisplayPort,
    C: TimePort,
    P: OutputPin,
{
    /// Construct the loop.  Does **not** touch the network; call
    /// [`start`](Self::start) next.
    pub fn new(config: SystemConfig, remote: R, hw: H, clock: C, registry: ActuatorRegistry<P>) -> Self {
        let sensor_timer = PeriodicTimer::new(config.sensor_interval_ms, clock.now_ms());
        let publish_throttle = UpdateThrottle::new(config.publish_every_samples);
        Self {
            config,
            remote,
            hw,
            clock,
            registry,
            ready: None,
            mirrored: MirroredState::default(),
            channel: ChannelState::Disconnected,
            phase: LoopPhase::Init,
            sensor_timer,
            publish_throttle,
            stats: LoopStats::default(),
            retry_attempt: 0,
        }
    }

    /// Attach a board "ready" LED.  It is held off until Init completes.
    pub fn with_ready_indicator(mut self, mut port: ActuatorPort<P>) -> Self {
        port.set(false);
        self.ready = Some(port);
        self
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Init: load the stored actuator values, light the ready LED and open
    /// the change stream.
    ///
    /// A failed subscription here is not fatal; the first tick retries it.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.phase = LoopPhase::Init;
        self.hw.notice(INIT_NOTICE);

        for id in ActuatorId::ALL {
            match self.remote.fetch_int(id.path()) {
                Ok(value) => {
                    self.apply_change(&ChangeEvent::put(id.path(), value), sink);
                }
                Err(error) => sink.emit(&AppEvent::InitialFetchFailed { id, error }),
            }
        }

        if let Some(ready) = self.ready.as_mut() {
            ready.set(true);
        }

        self.sensor_timer.fire(self.clock.now_ms());
        self.subscribe(sink);
        sink.emit(&AppEvent::Started);
        info!("ReconciliationLoop started ({:?})", self.channel);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one iteration.  Never fails: every problem is folded into
    /// state and reported through `sink`.
    pub fn tick(&mut self, sink: &mut impl EventSink) {
        self.stats.ticks += 1;

        if let ChannelState::Failed(_) = self.channel {
            // 1. Back off, resubscribe, nothing else this tick.
            self.recover(sink);
        } else {
            if self.channel != ChannelState::Streaming {
                self.subscribe(sink);
            }
            // 2. At most one change event.
            if self.channel == ChannelState::Streaming {
                self.service_channel(sink);
            }
            // 3. Sensor timer.
            let now = self.clock.now_ms();
            self.service_sensor(now, sink);
        }

        // 4. Display always reflects the last known state.
        self.render();

        // 5. Cooperative yield.
        self.clock.delay_ms(self.config.loop_tick_ms);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn channel_state(&self) -> ChannelState {
        self.channel
    }

    pub fn mirrored(&self) -> &MirroredState {
        &self.mirrored
    }

    /// What the display is showing.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.mirrored.snapshot()
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn registry(&self) -> &ActuatorRegistry<P> {
        &self.registry
    }

    pub fn ready_indicator(&self) -> Option<&ActuatorPort<P>> {
        self.ready.as_ref()
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn remote_mut(&mut self) -> &mut R {
        &mut self.remote
    }

    pub fn hw(&self) -> &H {
        &self.hw
    }

    pub fn hw_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    // ── Internal ──────────────────────────────────────────────

    fn subscribe(&mut self, sink: &mut impl EventSink) {
        self.channel = ChannelState::Subscribing;
        self.phase = LoopPhase::Connecting;
        self.stats.subscribe_attempts += 1;

        match self.remote.subscribe(&self.config.stream_path) {
            Ok(()) => {
                self.channel = ChannelState::Streaming;
                self.phase = LoopPhase::SubscribedIdle;
                self.retry_attempt = 0;
                sink.emit(&AppEvent::Subscribed);
            }
            Err(e) => {
                self.channel = ChannelState::Failed(e);
                self.phase = LoopPhase::ResubscribeWait;
                sink.emit(&AppEvent::SubscribeFailed(e));
            }
        }
    }

    fn recover(&mut self, sink: &mut impl EventSink) {
        self.retry_attempt = self.retry_attempt.saturating_add(1);
        self.phase = LoopPhase::ResubscribeWait;
        sink.emit(&AppEvent::Resubscribing {
            attempt: self.retry_attempt,
        });
        self.clock.delay_ms(self.config.resubscribe_backoff_ms);
        self.subscribe(sink);
    }

    fn service_channel(&mut self, sink: &mut impl EventSink) {
        match self.remote.poll() {
            None => self.phase = LoopPhase::SubscribedIdle,
            Some(Ok(event)) => {
                self.phase = LoopPhase::ProcessingEvent;
                match self.apply_change(&event, sink) {
                    ApplyOutcome::Applied { .. } => self.stats.events_applied += 1,
                    ApplyOutcome::Ignored(_) => self.stats.events_ignored += 1,
                }
                if self.config.resubscribe_after_event {
                    self.subscribe(sink);
                } else {
                    self.phase = LoopPhase::SubscribedIdle;
                }
            }
            Some(Err(e)) => {
                self.channel = ChannelState::Failed(e);
                self.phase = LoopPhase::ResubscribeWait;
                self.stats.channel_failures += 1;
                sink.emit(&AppEvent::ChannelFailed(e));
            }
        }
    }

    fn service_sensor(&mut self, now: u64, sink: &mut impl EventSink) {
        if !self.sensor_timer.due(now) {
            return;
        }

        let reading = self.hw.sample();
        self.stats.samples += 1;
        let (temp_ok, humid_ok) = self.mirrored.apply_reading(&reading);
        sink.emit(&AppEvent::SensorSampled(reading));
        if !(temp_ok && humid_ok) {
            sink.emit(&AppEvent::SensorFault {
                temperature: !temp_ok,
                humidity: !humid_ok,
            });
        }

        if self.publish_throttle.advance() {
            self.publish(sink);
        }

        self.sensor_timer.fire(now);
    }

    /// Push hook: invoked on every throttle wrap, transmits only when
    /// enabled in config.
    fn publish(&mut self, sink: &mut impl EventSink) {
        self.stats.publish_hook_calls += 1;
        let transmitted = self.config.publish_readings && self.push_readings();
        sink.emit(&AppEvent::PublishHook { transmitted });
    }

    fn push_readings(&mut self) -> bool {
        let t = self.mirrored.temperature();
        let h = self.mirrored.humidity();
        let res = self
            .remote
            .set_float(TEMPERATURE_PATH, t)
            .and_then(|()| self.remote.set_float(HUMIDITY_PATH, h));
        match res {
            Ok(()) => true,
            Err(e) => {
                warn!("publish: {}", e);
                false
            }
        }
    }

    fn apply_change(&mut self, event: &ChangeEvent, sink: &mut impl EventSink) -> ApplyOutcome {
        let outcome = self.registry.apply(event, &mut self.mirrored);
        match outcome {
            ApplyOutcome::Applied {
                id,
                value,
                on,
                changed,
            } => sink.emit(&AppEvent::ActuatorApplied {
                id,
                value,
                on,
                changed,
            }),
            ApplyOutcome::Ignored(reason) => sink.emit(&AppEvent::EventIgnored(reason)),
        }
        outcome
    }

    fn render(&mut self) {
        let lines = self.mirrored.snapshot().lines();
        self.hw.render(&lines);
    }
}
