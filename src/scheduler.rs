//! Non-blocking cadence gates for the cooperative loop.
//!
//! Nothing in here sleeps.  The loop asks "is it time?" once per tick and
//! does the work inline when the answer is yes.
//!
//! ```text
//!   tick ──▶ PeriodicTimer (elapsed ms) ──▶ sample sensors
//!                                                 │
//!                                                 ▼
//!                            UpdateThrottle (count of samples) ──▶ push hook
//! ```
//!
//! The loop tick itself is not a timer: it is the bounded yield performed
//! through [`TimePort::delay_ms`](crate::app::ports::TimePort::delay_ms) at
//! the end of every tick.

// ═══════════════════════════════════════════════════════════════
//  PeriodicTimer
// ═══════════════════════════════════════════════════════════════

/// Elapsed-time gate: due once `interval_ms` has passed since the last fire.
///
/// The baseline is reset to the timestamp passed to [`fire`](Self::fire), so
/// the cadence never drifts by more than one tick relative to that clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicTimer {
    last_fired_ms: u64,
    interval_ms: u64,
}

impl PeriodicTimer {
    /// Create a timer whose first period starts at `now_ms`.
    pub fn new(interval_ms: u32, now_ms: u64) -> Self {
        Self {
            last_fired_ms: now_ms,
            interval_ms: u64::from(interval_ms),
        }
    }

    /// `true` iff at least one full interval has elapsed since the last fire.
    ///
    /// A clock that appears to run backwards is treated as "not yet due".
    pub fn due(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_fired_ms) >= self.interval_ms
    }

    /// Reset the baseline to `now_ms`.
    pub fn fire(&mut self, now_ms: u64) {
        self.last_fired_ms = now_ms;
    }

    /// Check and fire in one step.  Returns whether the timer fired.
    pub fn fire_if_due(&mut self, now_ms: u64) -> bool {
        if self.due(now_ms) {
            self.fire(now_ms);
            true
        } else {
            false
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn last_fired_ms(&self) -> u64 {
        self.last_fired_ms
    }
}

// ═══════════════════════════════════════════════════════════════
//  UpdateThrottle
// ═══════════════════════════════════════════════════════════════

/// Count-based cadence derived from another timer's firings.
///
/// [`advance`](Self::advance) is called once per upstream firing and returns
/// `true` on every `every`-th call, at which point the counter wraps to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateThrottle {
    count: u32,
    every: u32,
}

impl UpdateThrottle {
    /// `every` is clamped to at least 1.
    pub fn new(every: u32) -> Self {
        Self {
            count: 0,
            every: every.max(1),
        }
    }

    /// Record one upstream firing.  Returns `true` when the counter wraps.
    pub fn advance(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.every {
            self.count = 0;
            true
        } else {
            false
        }
    }

    /// Firings recorded since the last wrap.
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn every(&self) -> u32 {
        self.every
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
