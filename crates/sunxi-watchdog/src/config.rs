//! Register window configuration.
//!
//! The defaults describe the Allwinner A10/A20 timer block. Only the location
//! of the window is configurable; the register values written by
//! [`WatchdogDevice`](crate::device::WatchdogDevice) and the kick interval are
//! fixed.

use crate::error::{WatchdogError, WatchdogResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Physical base address of the sunxi timer register block.
pub const SUNXI_TIMER_BASE: u64 = 0x01c2_0000;

/// Size of the mapped timer window in bytes.
pub const TIMER_WINDOW_LEN: usize = 4096;

/// Offset of the watchdog control register inside the timer window.
pub const WDOG_CTRL_OFFSET: usize = 0xc90;

/// Offset of the watchdog mode register inside the timer window.
pub const WDOG_MODE_OFFSET: usize = 0xc94;

/// Default physical memory device.
pub const DEFAULT_MEM_DEVICE: &str = "/dev/mem";

/// Interval between two kicks.
pub const KICK_INTERVAL: Duration = Duration::from_secs(1);

/// Mapping granularity the window must be aligned to.
pub const PAGE_SIZE: u64 = 4096;

const REGISTER_WIDTH: usize = 4;

/// Location of the watchdog registers in physical memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    /// Device node giving access to physical memory.
    pub mem_device: PathBuf,
    /// Physical base address of the timer window.
    pub base_address: u64,
    /// Length of the timer window in bytes.
    pub window_len: usize,
    /// Offset of the control (kick) register.
    pub control_offset: usize,
    /// Offset of the mode (arm/disarm) register.
    pub mode_offset: usize,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            mem_device: PathBuf::from(DEFAULT_MEM_DEVICE),
            base_address: SUNXI_TIMER_BASE,
            window_len: TIMER_WINDOW_LEN,
            control_offset: WDOG_CTRL_OFFSET,
            mode_offset: WDOG_MODE_OFFSET,
        }
    }
}

impl WatchdogConfig {
    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> WatchdogConfigBuilder {
        WatchdogConfigBuilder::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the window is misaligned or a register lies outside it.
    pub fn validate(&self) -> WatchdogResult<()> {
        if self.mem_device.as_os_str().is_empty() {
            return Err(WatchdogError::invalid_configuration(
                "mem_device must not be empty",
            ));
        }
        if self.base_address % PAGE_SIZE != 0 {
            return Err(WatchdogError::invalid_configuration(format!(
                "base_address {:#x} must be aligned to {PAGE_SIZE} bytes",
                self.base_address
            )));
        }
        if self.window_len == 0 || self.window_len as u64 % PAGE_SIZE != 0 {
            return Err(WatchdogError::invalid_configuration(format!(
                "window_len must be a non-zero multiple of {PAGE_SIZE}"
            )));
        }
        self.validate_register("control_offset", self.control_offset)?;
        self.validate_register("mode_offset", self.mode_offset)?;
        if self.control_offset == self.mode_offset {
            return Err(WatchdogError::invalid_configuration(
                "control_offset and mode_offset must differ",
            ));
        }
        Ok(())
    }

    fn validate_register(&self, name: &str, offset: usize) -> WatchdogResult<()> {
        if offset % REGISTER_WIDTH != 0 {
            return Err(WatchdogError::invalid_configuration(format!(
                "{name} {offset:#x} must be {REGISTER_WIDTH}-byte aligned"
            )));
        }
        let fits = offset
            .checked_add(REGISTER_WIDTH)
            .is_some_and(|end| end <= self.window_len);
        if !fits {
            return Err(WatchdogError::invalid_configuration(format!(
                "{name} {offset:#x} lies outside the {}-byte window",
                self.window_len
            )));
        }
        Ok(())
    }

    /// Memory device path.
    #[must_use]
    pub fn mem_device(&self) -> &Path {
        &self.mem_device
    }
}

/// Builder for `WatchdogConfig`.
#[derive(Debug, Default)]
pub struct WatchdogConfigBuilder {
    config: WatchdogConfig,
}

impl WatchdogConfigBuilder {
    /// Set the memory device path.
    #[must_use]
    pub fn mem_device(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.mem_device = path.into();
        self
    }

    /// Set the physical base address of the timer window.
    #[must_use]
    pub fn base_address(mut self, address: u64) -> Self {
        self.config.base_address = address;
        self
    }

    /// Set the window length in bytes.
    #[must_use]
    pub fn window_len(mut self, len: usize) -> Self {
        self.config.window_len = len;
        self
    }

    /// Set the control register offset.
    #[must_use]
    pub fn control_offset(mut self, offset: usize) -> Self {
        self.config.control_offset = offset;
        self
    }

    /// Set the mode register offset.
    #[must_use]
    pub fn mode_offset(mut self, offset: usize) -> Self {
        self.config.mode_offset = offset;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> WatchdogResult<WatchdogConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
