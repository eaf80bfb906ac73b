//! Watchdog register access.
//!
//! [`WatchdogDevice`] writes the three fixed bit patterns the sunxi watchdog
//! understands. It never reads a register back and never caches register
//! contents: every call is a single store that the hardware sees immediately.
//!
//! # State Machine
//!
//! ```text
//! Disarmed ──arm()──► Armed ──kick()──► Armed
//!     ▲                 │
//!     └────disarm()─────┘
//! ```
//!
//! Leaving the device armed without kicking it resets the board once the
//! hardware interval elapses.

/// Mode register value selecting the reset interval and enabling reset.
pub const WDOG_MODE_ARM: u32 = (5 << 3) | 3;

/// Mode register value disabling the watchdog.
pub const WDOG_MODE_DISARM: u32 = 0;

/// Control register value: restart key plus restart strobe.
pub const WDOG_CTRL_KICK: u32 = (0x0a57 << 1) | 1;

/// Watchdog registers of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// Control register, takes the kick strobe.
    Control,
    /// Mode register, arms and disarms the watchdog.
    Mode,
}

impl Register {
    /// Get the register name as a string slice.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Control => "wdog_ctrl",
            Self::Mode => "wdog_mode",
        }
    }
}

impl core::fmt::Display for Register {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write access to the watchdog register block.
///
/// Implementations must make each write visible to the hardware before
/// returning (volatile store, no buffering).
pub trait RegisterBlock: Send {
    /// Store `value` into `register`.
    fn write(&self, register: Register, value: u32);
}

impl<R: RegisterBlock + Sync + ?Sized> RegisterBlock for &R {
    fn write(&self, register: Register, value: u32) {
        (**self).write(register, value);
    }
}

/// Counters of the writes issued to the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceMetrics {
    /// Number of `arm()` calls.
    pub arm_count: u64,
    /// Number of `kick()` calls.
    pub kick_count: u64,
    /// Number of `disarm()` calls.
    pub disarm_count: u64,
}

/// The sunxi hardware watchdog.
///
/// Dropping the device does not touch the hardware: an armed watchdog stays
/// armed, which is what the expiry path relies on.
#[derive(Debug)]
pub struct WatchdogDevice<R: RegisterBlock> {
    registers: R,
    metrics: DeviceMetrics,
}

impl<R: RegisterBlock> WatchdogDevice<R> {
    /// Wrap a register block.
    #[must_use]
    pub fn new(registers: R) -> Self {
        Self {
            registers,
            metrics: DeviceMetrics::default(),
        }
    }

    /// Arm the watchdog. Re-arming writes the same pattern again.
    pub fn arm(&mut self) {
        self.registers.write(Register::Mode, WDOG_MODE_ARM);
        self.metrics.arm_count = self.metrics.arm_count.saturating_add(1);
        tracing::info!("Activating the watchdog");
    }

    /// Restart the hardware countdown.
    pub fn kick(&mut self) {
        self.registers.write(Register::Control, WDOG_CTRL_KICK);
        self.metrics.kick_count = self.metrics.kick_count.saturating_add(1);
        tracing::trace!(kicks = self.metrics.kick_count, "Watchdog kicked");
    }

    /// Disable the watchdog until the next `arm()`.
    pub fn disarm(&mut self) {
        self.registers.write(Register::Mode, WDOG_MODE_DISARM);
        self.metrics.disarm_count = self.metrics.disarm_count.saturating_add(1);
        tracing::info!("Deactivating the watchdog");
    }

    /// Get the write counters.
    #[must_use]
    pub fn metrics(&self) -> DeviceMetrics {
        self.metrics
    }

    /// Borrow the underlying register block.
    #[must_use]
    pub fn registers(&self) -> &R {
        &self.registers
    }
}
