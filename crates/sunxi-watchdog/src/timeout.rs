//! Shared countdown used by the interactive-timeout mode.
//!
//! The feeder thread refreshes the counter with [`TimeoutState::set`] and the
//! kick loop counts it down with [`TimeoutState::tick`]. Both go through the
//! same mutex, so a refresh and a decrement never interleave.

use parking_lot::Mutex;

/// Refresh value that disables the watchdog instead of setting a timeout.
pub const DISABLE_SENTINEL: i64 = -1;

/// Value held by the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    /// Seconds left before the watchdog is allowed to fire.
    Remaining(u32),
    /// The disable sentinel was received.
    Disabled,
}

impl core::fmt::Display for Counter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Remaining(seconds) => write!(f, "{seconds}s"),
            Self::Disabled => f.write_str("disabled"),
        }
    }
}

/// Result of one countdown step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The counter was decremented and now holds this value.
    Remaining(u32),
    /// The counter was already zero.
    Expired,
    /// The sentinel was received; the counter is left untouched.
    Disabled,
}

/// Map a raw refresh value onto the countdown.
///
/// The sentinel always disables, whatever the limit. Anything else is clamped
/// into `0..=upper_limit`.
#[must_use]
pub fn clamp_refresh(raw: i64, upper_limit: u32) -> Counter {
    if raw == DISABLE_SENTINEL {
        return Counter::Disabled;
    }
    let clamped = raw.clamp(0, i64::from(upper_limit));
    Counter::Remaining(u32::try_from(clamped).unwrap_or(upper_limit))
}

/// Countdown shared between the feeder and the kick loop.
#[derive(Debug)]
pub struct TimeoutState {
    upper_limit: u32,
    counter: Mutex<Counter>,
}

impl TimeoutState {
    /// Start the countdown at `upper_limit`, which also becomes the
    /// ceiling for every later refresh.
    #[must_use]
    pub fn new(upper_limit: u32) -> Self {
        Self {
            upper_limit,
            counter: Mutex::new(Counter::Remaining(upper_limit)),
        }
    }

    /// Ceiling fixed at construction.
    #[must_use]
    pub fn upper_limit(&self) -> u32 {
        self.upper_limit
    }

    /// Current counter value.
    #[must_use]
    pub fn counter(&self) -> Counter {
        *self.counter.lock()
    }

    /// Store a refresh value and return what was stored.
    pub fn set(&self, raw: i64) -> Counter {
        let value = clamp_refresh(raw, self.upper_limit);
        *self.counter.lock() = value;
        value
    }

    /// Advance the countdown by one second.
    pub fn tick(&self) -> TickOutcome {
        let mut counter = self.counter.lock();
        match *counter {
            Counter::Disabled => TickOutcome::Disabled,
            Counter::Remaining(0) => TickOutcome::Expired,
            Counter::Remaining(seconds) => {
                let left = seconds.saturating_sub(1);
                *counter = Counter::Remaining(left);
                TickOutcome::Remaining(left)
            }
        }
    }
}
