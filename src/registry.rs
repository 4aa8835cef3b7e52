//! Actuator registry: maps remote paths onto physical outputs.
//!
//! ```text
//!  ChangeEvent{Put, "/PowerAC", 0}
//!        │
//!        ▼
//!  ActuatorRegistry ──▶ Binding(PowerOutlet)
//!        │                 ├─ primary   (relay, active-low)   ─▶ LOW
//!        │                 └─ indicator (LED,   active-high)  ─▶ HIGH
//!        ▼
//!  MirroredState[PowerOutlet] = 0
//! ```
//!
//! The remote convention is inverted: a stored value of `0` means "on".
//! Anything that is not a `Put` on a known path is ignored without error.

use embedded_hal::digital::{Error as _, OutputPin};
use log::{debug, info, trace, warn};

use crate::app::state::MirroredState;
use crate::remote::event::{ChangeEvent, EventKind};

// ───────────────────────────────────────────────────────────────
// Actuator identity
// ───────────────────────────────────────────────────────────────

/// Every remotely controllable output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ActuatorId {
    Bulb = 0,
    PowerOutlet = 1,
}

impl ActuatorId {
    /// Total number of actuators: sizes every per-actuator array.
    pub const COUNT: usize = 2;

    pub const ALL: [ActuatorId; Self::COUNT] = [Self::Bulb, Self::PowerOutlet];

    /// Remote path that carries this actuator's desired state.
    pub const fn path(self) -> &'static str {
        match self {
            Self::Bulb => "/LedStatus",
            Self::PowerOutlet => "/PowerAC",
        }
    }

    /// Reverse lookup; `None` for every unrecognised path.
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.path() == path)
    }

    /// Label used on the status display.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bulb => "LED",
            Self::PowerOutlet => "Power AC",
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Decode the remote value convention: `0` activates.
pub const fn value_means_on(value: i32) -> bool {
    value == 0
}

// ───────────────────────────────────────────────────────────────
// ActuatorPort
// ───────────────────────────────────────────────────────────────

/// Electrical polarity of an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Pin LOW = on (relay modules, board LEDs sinking current).
    ActiveLow,
    /// Pin HIGH = on.
    ActiveHigh,
}

impl Polarity {
    /// Electrical level that represents the logical state `on`.
    pub const fn level_for(self, on: bool) -> bool {
        match self {
            Self::ActiveLow => !on,
            Self::ActiveHigh => on,
        }
    }
}

/// A named logical on/off output bound to one GPIO with a fixed polarity.
///
/// Writes are skipped when the pin is already at the requested level, so
/// re-applying the same state has no physical effect.
pub struct ActuatorPort<P> {
    name: &'static str,
    pin: P,
    polarity: Polarity,
    /// Last level successfully written; `None` until the first write.
    level: Option<bool>,
}

impl<P: OutputPin> ActuatorPort<P> {
    /// Wrap `pin`.  Nothing is written until the first [`set`](Self::set).
    pub fn new(name: &'static str, pin: P, polarity: Polarity) -> Self {
        Self {
            name,
            pin,
            polarity,
            level: None,
        }
    }

    /// Drive the output to the logical state `on`.
    ///
    /// Returns `true` if the pin level changed.  A failed write is logged and
    /// leaves the cached level unknown so the next call retries.
    pub fn set(&mut self, on: bool) -> bool {
        let high = self.polarity.level_for(on);
        if self.level == Some(high) {
            return false;
        }
        let res = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match res {
            Ok(()) => {
                self.level = Some(high);
                trace!("{}: {} (pin {})", self.name, on_off(on), if high { "HIGH" } else { "LOW" });
                true
            }
            Err(e) => {
                warn!("{}: GPIO write failed ({:?})", self.name, e.kind());
                self.level = None;
                false
            }
        }
    }

    /// Logical state, if the pin has been written.
    pub fn is_on(&self) -> Option<bool> {
        self.level.map(|high| high == self.polarity.level_for(true))
    }

    /// Last electrical level written.
    pub fn level(&self) -> Option<bool> {
        self.level
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

// ───────────────────────────────────────────────────────────────
// Binding + registry
// ───────────────────────────────────────────────────────────────

/// One actuator: its primary output plus an optional companion indicator
/// that mirrors the logical state.
pub struct Binding<P> {
    pub id: ActuatorId,
    pub primary: ActuatorPort<P>,
    pub indicator: Option<ActuatorPort<P>>,
}

impl<P: OutputPin> Binding<P> {
    pub fn new(id: ActuatorId, primary: ActuatorPort<P>, indicator: Option<ActuatorPort<P>>) -> Self {
        Self {
            id,
            primary,
            indicator,
        }
    }

    fn drive(&mut self, on: bool) -> bool {
        let mut changed = self.primary.set(on);
        if let Some(ind) = self.indicator.as_mut() {
            changed |= ind.set(on);
        }
        changed
    }
}

/// Why an event produced no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Event kind other than `Put`.
    NotPut,
    /// `Put` on a path with no bound actuator.
    UnknownPath,
}

/// Result of [`ActuatorRegistry::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied {
        id: ActuatorId,
        value: i32,
        on: bool,
        /// Whether any pin level actually changed.
        changed: bool,
    },
    Ignored(IgnoreReason),
}

/// Owns every actuator binding, indexed by [`ActuatorId`].
pub struct ActuatorRegistry<P> {
    bindings: [Binding<P>; ActuatorId::COUNT],
}

impl<P: OutputPin> ActuatorRegistry<P> {
    /// Build the registry and drive every output to its inactive level.
    ///
    /// `bindings` must be ordered by [`ActuatorId::index`].
    pub fn new(bindings: [Binding<P>; ActuatorId::COUNT]) -> Self {
        debug_assert!(
            bindings.iter().enumerate().all(|(i, b)| b.id.index() == i),
            "bindings out of ActuatorId order"
        );
        let mut reg = Self { bindings };
        for b in &mut reg.bindings {
            b.drive(false);
        }
        info!("ActuatorRegistry: {} actuators, all outputs off", ActuatorId::COUNT);
        reg
    }

    /// Apply one change event.
    ///
    /// Recognised `Put` events drive the primary output and its indicator and
    /// record the raw value in `mirrored`.  Everything else is a no-op.
    pub fn apply(&mut self, event: &ChangeEvent, mirrored: &mut MirroredState) -> ApplyOutcome {
        if event.kind != EventKind::Put {
            trace!("registry: ignoring {:?} on '{}'", event.kind, event.path);
            return ApplyOutcome::Ignored(IgnoreReason::NotPut);
        }
        let Some(id) = ActuatorId::from_path(&event.path) else {
            trace!("registry: no actuator bound to '{}'", event.path);
            return ApplyOutcome::Ignored(IgnoreReason::UnknownPath);
        };

        let on = value_means_on(event.value);
        let changed = self.bindings[id.index()].drive(on);
        mirrored.set_actuator(id, event.value);
        debug!("registry: {:?} <- {} ({}{})", id, event.value, on_off(on), if changed { "" } else { ", unchanged" });

        ApplyOutcome::Applied {
            id,
            value: event.value,
            on,
            changed,
        }
    }

    pub fn binding(&self, id: ActuatorId) -> &Binding<P> {
        &self.bindings[id.index()]
    }

    /// Logical state of `id`'s primary output.
    pub fn is_on(&self, id: ActuatorId) -> Option<bool> {
        self.bindings[id.index()].primary.is_on()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
