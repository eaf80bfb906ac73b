//! The kick loop.
//!
//! [`KickScheduler`] arms the device and then repeats one cycle until a
//! terminal state is reached:
//!
//! ```text
//!           ┌───────────────────────────────────────────┐
//!           ▼                                           │
//!   check liveness ──Healthy──► wait 1s ──Elapsed──► kick
//!     │    │    │                  │
//!     │    │    └─Expired──► stop kicking (never returns to Armed)
//!     │    └─Finished──► disarm, clean exit
//!     └─Disable──► disarm, disabled exit
//!                                  └─Interrupted──► disarm, interrupted exit
//! ```
//!
//! The scheduler is the only writer of the device. Refreshes from other
//! threads reach it through the [`LivenessSource`] it polls, one cycle later
//! at most.

use crate::config::KICK_INTERVAL;
use crate::device::{RegisterBlock, WatchdogDevice};
use crate::timeout::{TickOutcome, TimeoutState};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

/// Why a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// The full interval elapsed.
    Elapsed,
    /// An operator interrupt arrived during the wait.
    Interrupted,
}

/// Source of the one-second cadence.
pub trait Ticker {
    /// Block until the next kick is due.
    fn wait(&mut self) -> Wake;
}

impl<T: Ticker + ?Sized> Ticker for &mut T {
    fn wait(&mut self) -> Wake {
        (**self).wait()
    }
}

/// Wall-clock ticker, optionally woken early by an interrupt channel.
#[derive(Debug)]
pub struct IntervalTicker {
    interval: Duration,
    interrupts: Option<Receiver<()>>,
}

impl IntervalTicker {
    /// Tick every [`KICK_INTERVAL`], ignoring interrupts.
    #[must_use]
    pub fn new() -> Self {
        Self {
            interval: KICK_INTERVAL,
            interrupts: None,
        }
    }

    /// Tick every [`KICK_INTERVAL`]; any message on `interrupts` ends the
    /// current wait with [`Wake::Interrupted`].
    #[must_use]
    pub fn with_interrupts(interrupts: Receiver<()>) -> Self {
        Self {
            interval: KICK_INTERVAL,
            interrupts: Some(interrupts),
        }
    }
}

impl Default for IntervalTicker {
    fn default() -> Self {
        Self::new()
    }
}

impl Ticker for IntervalTicker {
    fn wait(&mut self) -> Wake {
        let deadline = Instant::now() + self.interval;
        if let Some(interrupts) = &self.interrupts {
            match interrupts.recv_timeout(self.interval) {
                Ok(()) => return Wake::Interrupted,
                Err(RecvTimeoutError::Timeout) => return Wake::Elapsed,
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::debug!("Interrupt channel closed, continuing without it");
                    self.interrupts = None;
                }
            }
        }
        std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
        Wake::Elapsed
    }
}

/// Why the watchdog was left to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryReason {
    /// The interactive countdown reached zero.
    TimeoutElapsed,
    /// The supervised command exited with a nonzero code.
    ChildFailed {
        /// Exit code.
        code: i32,
    },
    /// The supervised command was killed.
    ChildCrashed {
        /// Terminating signal, when known.
        signal: Option<i32>,
    },
    /// The supervised command could not be started.
    LaunchFailed,
}

impl core::fmt::Display for ExpiryReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TimeoutElapsed => f.write_str("timeout elapsed"),
            Self::ChildFailed { code } => write!(f, "supervised command exited with {code}"),
            Self::ChildCrashed { signal: Some(signal) } => {
                write!(f, "supervised command killed by signal {signal}")
            }
            Self::ChildCrashed { signal: None } => f.write_str("supervised command crashed"),
            Self::LaunchFailed => f.write_str("supervised command could not be launched"),
        }
    }
}

/// What a liveness source reports for the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Keep kicking.
    Healthy,
    /// A clean disable was requested.
    Disable,
    /// The supervised work completed successfully.
    Finished,
    /// Stop kicking for good.
    Expired(ExpiryReason),
}

/// Something the scheduler can ask "is the system still alive?".
pub trait LivenessSource {
    /// Evaluate liveness once. Called exactly once per cycle, before the wait.
    fn check(&mut self) -> Verdict;
}

/// Liveness source that is always healthy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupervised;

impl LivenessSource for Unsupervised {
    fn check(&mut self) -> Verdict {
        Verdict::Healthy
    }
}

impl LivenessSource for Arc<TimeoutState> {
    fn check(&mut self) -> Verdict {
        match self.tick() {
            TickOutcome::Remaining(seconds) => {
                tracing::trace!(counter = seconds, "Countdown advanced");
                Verdict::Healthy
            }
            TickOutcome::Disabled => Verdict::Disable,
            TickOutcome::Expired => Verdict::Expired(ExpiryReason::TimeoutElapsed),
        }
    }
}

/// How the kick loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The disable sentinel was observed; the device is disarmed.
    Disabled,
    /// The supervised command exited successfully; the device is disarmed.
    CleanExit,
    /// An operator interrupt arrived; the device is disarmed.
    Interrupted,
    /// Kicking stopped with the device still armed.
    Expired(ExpiryReason),
}

impl Termination {
    /// Whether the hardware watchdog is left to fire.
    #[must_use]
    pub fn is_expired(self) -> bool {
        matches!(self, Self::Expired(_))
    }

    /// Process exit code for the graceful outcomes.
    ///
    /// # Errors
    ///
    /// Returns the expiry reason when the process must not exit and the
    /// hardware watchdog is left to fire instead.
    pub fn exit_code(self) -> Result<i32, ExpiryReason> {
        match self {
            Self::Disabled | Self::CleanExit | Self::Interrupted => Ok(0),
            Self::Expired(reason) => Err(reason),
        }
    }
}

/// Periodic kicker driving a [`WatchdogDevice`].
#[derive(Debug)]
pub struct KickScheduler<R: RegisterBlock, T: Ticker> {
    device: WatchdogDevice<R>,
    ticker: T,
    cycles: u64,
}

impl<R: RegisterBlock, T: Ticker> KickScheduler<R, T> {
    /// Arm `device` and take ownership of it.
    #[must_use]
    pub fn arm(mut device: WatchdogDevice<R>, ticker: T) -> Self {
        device.arm();
        Self {
            device,
            ticker,
            cycles: 0,
        }
    }

    /// Run the loop until `liveness` reaches a terminal state or the ticker
    /// reports an interrupt.
    ///
    /// Returning [`Termination::Expired`] means the last kick has already
    /// happened; the caller must not kick the device again.
    pub fn run<L: LivenessSource + ?Sized>(&mut self, liveness: &mut L) -> Termination {
        loop {
            match liveness.check() {
                Verdict::Healthy => {}
                Verdict::Disable => {
                    tracing::info!(cycles = self.cycles, "Disable requested");
                    self.device.disarm();
                    return Termination::Disabled;
                }
                Verdict::Finished => {
                    tracing::info!(cycles = self.cycles, "Supervised work finished");
                    self.device.disarm();
                    return Termination::CleanExit;
                }
                Verdict::Expired(reason) => {
                    tracing::error!(
                        cycles = self.cycles,
                        reason = %reason,
                        "Liveness lost, no further kicks"
                    );
                    return Termination::Expired(reason);
                }
            }

            if self.ticker.wait() == Wake::Interrupted {
                tracing::info!(cycles = self.cycles, "Interrupted");
                self.device.disarm();
                return Termination::Interrupted;
            }

            self.device.kick();
            self.cycles = self.cycles.saturating_add(1);
        }
    }

    /// Completed kick cycles.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Borrow the device.
    #[must_use]
    pub fn device(&self) -> &WatchdogDevice<R> {
        &self.device
    }

    /// Give the device back.
    #[must_use]
    pub fn into_device(self) -> WatchdogDevice<R> {
        self.device
    }
}
