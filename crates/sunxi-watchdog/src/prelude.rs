//! Prelude for sunxi-watchdog.
//!
//! This module re-exports the most commonly used types for convenient importing.
//!
//! # Example
//!
//! ```rust
//! use sunxi_watchdog::prelude::*;
//! use std::sync::Arc;
//!
//! let state = Arc::new(TimeoutState::new(5));
//! let feeder = InputFeeder::new(Arc::clone(&state));
//! feeder.apply("3");
//! assert_eq!(state.counter(), Counter::Remaining(3));
//! ```

pub use crate::config::{KICK_INTERVAL, WatchdogConfig, WatchdogConfigBuilder};
pub use crate::device::{DeviceMetrics, Register, RegisterBlock, WatchdogDevice};
pub use crate::error::{WatchdogError, WatchdogResult};
pub use crate::feeder::{FeedSummary, InputFeeder, parse_refresh};
#[cfg(unix)]
pub use crate::mmio::PhysicalWindow;
pub use crate::scheduler::{
    ExpiryReason, IntervalTicker, KickScheduler, LivenessSource, Termination, Ticker,
    Unsupervised, Verdict, Wake,
};
pub use crate::supervisor::{ChildProcess, ChildStatus, ProcessSupervisor};
pub use crate::timeout::{Counter, DISABLE_SENTINEL, TickOutcome, TimeoutState, clamp_refresh};
