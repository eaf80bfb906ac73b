//! # sunxi-watchdog
//!
//! Supervision engine for the hardware watchdog of Allwinner sunxi SoCs.
//!
//! The watchdog resets the board unless it is kicked at least once per
//! hardware interval. This crate arms it, kicks it once per second while the
//! supervised workload is alive, and deliberately stops kicking when it is not.
//!
//! ## Supervision modes
//!
//! - **Process supervision**: [`ProcessSupervisor`] runs a command; a clean
//!   exit disarms the watchdog, a failure or crash lets it fire.
//! - **Interactive timeout**: [`InputFeeder`] refreshes a [`TimeoutState`]
//!   countdown from a text feed; reaching zero lets the watchdog fire, the
//!   sentinel `-1` disarms it.
//! - **Unsupervised**: [`Unsupervised`] keeps kicking until interrupted.
//!
//! ## Architecture
//!
//! - [`device`] - Register values and the [`WatchdogDevice`] driver
//! - [`mmio`] - `/dev/mem` register window
//! - [`timeout`] - Shared countdown
//! - [`scheduler`] - The kick loop and its liveness contract
//! - [`supervisor`] - Child-process liveness
//! - [`feeder`] - Refresh feed parsing
//! - [`terminal`] - The expired state
//! - [`config`] - Register window location
//! - [`error`] - Start-up errors
//!
//! ## Example
//!
//! ```rust
//! use sunxi_watchdog::prelude::*;
//! use sunxi_watchdog::testing::{RecordingRegisters, ScriptedTicker};
//! use std::sync::Arc;
//!
//! let registers = RecordingRegisters::new();
//! let state = Arc::new(TimeoutState::new(2));
//! let mut scheduler = KickScheduler::arm(WatchdogDevice::new(&registers), ScriptedTicker::new());
//!
//! let outcome = scheduler.run(&mut Arc::clone(&state));
//! assert_eq!(outcome, Termination::Expired(ExpiryReason::TimeoutElapsed));
//! assert_eq!(scheduler.device().metrics().kick_count, 2);
//! ```

#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod device;
pub mod error;
pub mod feeder;
#[cfg(unix)]
pub mod mmio;
pub mod prelude;
pub mod scheduler;
pub mod supervisor;
pub mod terminal;
pub mod testing;
pub mod timeout;

pub use config::WatchdogConfig;
pub use device::WatchdogDevice;
pub use error::{WatchdogError, WatchdogResult};
pub use feeder::InputFeeder;
#[cfg(unix)]
pub use mmio::PhysicalWindow;
pub use scheduler::{KickScheduler, Termination, Unsupervised};
pub use supervisor::ProcessSupervisor;
pub use timeout::TimeoutState;
