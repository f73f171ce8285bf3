//! Countdown state machine and the clock it reads.
//!
//! The countdown captures its target once at start and recomputes the
//! remaining time on every tick. It never re-reads the snapshot.
//!
//! ```text
//! Idle --start--> Running --tick (remaining > 0)--> Running
//!                 Running --tick (remaining <= 0)--> Expired
//! ```
//!
//! [`Countdown`] is pure: it is driven by explicit `now` values so the
//! decomposition can be tested without timers. The controller owns the
//! ticking task around it.

use chrono::{DateTime, TimeDelta, Utc};
use tokio::time::Instant;

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_HOUR: i64 = 3_600;
const SECS_PER_DAY: i64 = 86_400;

/// Remaining time decomposed into whole units.
///
/// The derived ordering compares days first, so it orders by total time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Remaining {
    /// Whole days.
    pub days: i64,
    /// Hours, 0 to 23.
    pub hours: u32,
    /// Minutes, 0 to 59.
    pub minutes: u32,
    /// Seconds, 0 to 59.
    pub seconds: u32,
}

impl Remaining {
    /// Floor-decompose a positive duration.
    ///
    /// Returns `None` when `delta` is zero or negative. Sub-second rests are
    /// truncated, so 500 ms left decomposes to all zeros.
    pub fn from_delta(delta: TimeDelta) -> Option<Self> {
        if delta <= TimeDelta::zero() {
            return None;
        }
        let total = delta.num_seconds();
        // Divisors are non-zero constants and `total` is non-negative.
        #[allow(clippy::arithmetic_side_effects)]
        let remaining = Self {
            days: total / SECS_PER_DAY,
            hours: unit(total % SECS_PER_DAY / SECS_PER_HOUR),
            minutes: unit(total % SECS_PER_HOUR / SECS_PER_MINUTE),
            seconds: unit(total % SECS_PER_MINUTE),
        };
        Some(remaining)
    }
}

fn unit(value: i64) -> u32 {
    u32::try_from(value).unwrap_or_default()
}

/// States of the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    /// No target captured.
    Idle,
    /// Counting down to `target`.
    Running {
        /// The predicted time captured at start.
        target: DateTime<Utc>,
    },
    /// The target has passed; no further updates.
    Expired,
}

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Still running; show this remaining time.
    Remaining(Remaining),
    /// The target was reached on this tick; show the expiry label once.
    Expired,
    /// Idle or already expired; nothing to show.
    Inactive,
}

/// The countdown state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    state: CountdownState,
}

impl Countdown {
    /// A countdown in [`CountdownState::Idle`].
    pub const fn new() -> Self {
        Self {
            state: CountdownState::Idle,
        }
    }

    /// Current state.
    pub const fn state(&self) -> CountdownState {
        self.state
    }

    /// Capture `target` and enter [`CountdownState::Running`], whatever the
    /// previous state was.
    pub const fn start(&mut self, target: DateTime<Utc>) {
        self.state = CountdownState::Running { target };
    }

    /// Recompute the remaining time at `now`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Tick {
        let CountdownState::Running { target } = self.state else {
            return Tick::Inactive;
        };
        match Remaining::from_delta(target.signed_duration_since(now)) {
            Some(remaining) => Tick::Remaining(remaining),
            None => {
                self.state = CountdownState::Expired;
                Tick::Expired
            }
        }
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

/// The wall clock the countdown reads.
#[derive(Debug, Clone, Copy, Default)]
pub enum WallClock {
    /// The system clock, read on every call.
    #[default]
    System,
    /// A fixed wall time advanced by the runtime's monotonic clock.
    ///
    /// Under a paused test runtime this moves only when time is advanced.
    Anchored {
        /// Wall time at the anchor.
        wall: DateTime<Utc>,
        /// Runtime instant at the anchor.
        instant: Instant,
    },
}

impl WallClock {
    /// A clock that reads `wall` right now and then follows the runtime
    /// clock.
    pub fn anchored_at(wall: DateTime<Utc>) -> Self {
        Self::Anchored {
            wall,
            instant: Instant::now(),
        }
    }

    /// Current wall time.
    pub fn now(&self) -> DateTime<Utc> {
        match *self {
            Self::System => Utc::now(),
            Self::Anchored { wall, instant } => {
                let elapsed = TimeDelta::from_std(instant.elapsed()).unwrap_or(TimeDelta::MAX);
                wall.checked_add_signed(elapsed)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC)
            }
        }
    }
}
