//! Shared plumbing for the `watchdog-supervisor` and `watchdog-feeder` binaries.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use sunxi_watchdog::config::{DEFAULT_MEM_DEVICE, SUNXI_TIMER_BASE};
use sunxi_watchdog::{
    PhysicalWindow, Termination, WatchdogConfig, WatchdogDevice, WatchdogError, terminal,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Options shared by both binaries.
#[derive(Debug, Clone, Args)]
pub struct DeviceArgs {
    /// Physical memory device to map the timer registers from
    #[arg(
        long,
        value_name = "PATH",
        env = "SUNXI_WDT_MEM_DEVICE",
        default_value = DEFAULT_MEM_DEVICE
    )]
    pub mem_device: PathBuf,

    /// Physical base address of the timer block (hex with 0x, or decimal)
    #[arg(
        long,
        value_name = "ADDR",
        env = "SUNXI_WDT_BASE",
        value_parser = parse_address,
        default_value_t = SUNXI_TIMER_BASE
    )]
    pub base_address: u64,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl DeviceArgs {
    /// Build the register window configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn config(&self) -> Result<WatchdogConfig, WatchdogError> {
        WatchdogConfig::builder()
            .mem_device(&self.mem_device)
            .base_address(self.base_address)
            .build()
    }

    /// Map the register window and wrap it in a device.
    ///
    /// # Errors
    ///
    /// Returns an error if the window cannot be mapped.
    pub fn open(&self) -> Result<WatchdogDevice<PhysicalWindow>> {
        let config = self.config().context("invalid register window")?;
        let window = PhysicalWindow::open(&config).map_err(|err| {
            let hint = if err.is_permission_denied() {
                " (root privileges are required)"
            } else {
                ""
            };
            anyhow::Error::new(err).context(format!("cannot access the watchdog{hint}"))
        })?;
        Ok(WatchdogDevice::new(window))
    }
}

/// Parse an address in `0x` hex or decimal form.
///
/// # Errors
///
/// Returns a message if the text is not a number.
pub fn parse_address(raw: &str) -> Result<u64, String> {
    let raw = raw.trim();
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => raw.parse::<u64>(),
    };
    parsed.map_err(|err| format!("invalid address '{raw}': {err}"))
}

/// Install the stderr subscriber. `RUST_LOG` overrides the verbosity flag.
pub fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Map a kick loop termination onto the process.
///
/// Graceful outcomes exit with status 0. Expiry never returns: the thread
/// parks and the hardware watchdog resets the board.
pub fn finish(termination: Termination) -> ! {
    match termination.exit_code() {
        Ok(code) => exit_process(code),
        Err(reason) => terminal::expire(reason),
    }
}

/// Terminate the whole process from any thread.
#[expect(
    clippy::exit,
    reason = "the kick thread must end the process while main blocks on input"
)]
pub fn exit_process(code: i32) -> ! {
    std::process::exit(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        device: DeviceArgs,
    }

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x01c20000"), Ok(0x01c2_0000));
        assert_eq!(parse_address("0X1000"), Ok(0x1000));
        assert_eq!(parse_address("4096"), Ok(4096));
        assert!(parse_address("0xzz").is_err());
        assert!(parse_address("").is_err());
    }

    #[test]
    fn test_device_args_defaults() -> TestResult {
        let harness = Harness::try_parse_from(["test"])?;
        assert_eq!(harness.device.mem_device, PathBuf::from("/dev/mem"));
        assert_eq!(harness.device.base_address, SUNXI_TIMER_BASE);
        assert_eq!(harness.device.verbose, 0);
        harness.device.config()?;
        Ok(())
    }

    #[test]
    fn test_device_args_overrides() -> TestResult {
        let harness = Harness::try_parse_from([
            "test",
            "--mem-device",
            "/tmp/mem",
            "--base-address",
            "0x2000",
            "-vv",
        ])?;
        let config = harness.device.config()?;
        assert_eq!(config.base_address, 0x2000);
        assert_eq!(config.mem_device, PathBuf::from("/tmp/mem"));
        assert_eq!(harness.device.verbose, 2);
        Ok(())
    }

    #[test]
    fn test_misaligned_base_is_rejected() -> TestResult {
        let harness = Harness::try_parse_from(["test", "--base-address", "0x2004"])?;
        assert!(harness.device.config().is_err());
        Ok(())
    }

    #[test]
    fn test_open_missing_device_fails() -> TestResult {
        let harness = Harness::try_parse_from([
            "test",
            "--mem-device",
            "/nonexistent/sunxi-watchdog-mem",
        ])?;
        let err = harness
            .device
            .open()
            .err()
            .ok_or("opening a missing device should fail")?;
        assert!(format!("{err:#}").contains("cannot access the watchdog"));
        Ok(())
    }
}
