//! Physical register window backed by `/dev/mem`.

use crate::config::WatchdogConfig;
use crate::device::{Register, RegisterBlock};
use crate::error::{WatchdogError, WatchdogResult};
use memmap2::{MmapOptions, MmapRaw};
use std::fs::OpenOptions;
use std::os::unix::fs::OpenOptionsExt;

/// A shared, uncached mapping of the timer register block.
///
/// Offsets are checked against the window once, at construction. Writes are
/// volatile 32-bit stores.
#[derive(Debug)]
pub struct PhysicalWindow {
    map: MmapRaw,
    base_address: u64,
    control_offset: usize,
    mode_offset: usize,
}

impl PhysicalWindow {
    /// Map the window described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the memory device
    /// cannot be opened (typically missing root privileges) or the mapping
    /// fails.
    pub fn open(config: &WatchdogConfig) -> WatchdogResult<Self> {
        config.validate()?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(config.mem_device())
            .map_err(|source| WatchdogError::open_mem_device(config.mem_device(), source))?;

        let map = MmapOptions::new()
            .offset(config.base_address)
            .len(config.window_len)
            .map_raw(&file)
            .map_err(|source| {
                WatchdogError::map_window(config.base_address, config.window_len, source)
            })?;

        if map.len() < config.window_len {
            return Err(WatchdogError::map_window(
                config.base_address,
                config.window_len,
                std::io::Error::other("mapping shorter than requested"),
            ));
        }

        tracing::debug!(
            device = %config.mem_device().display(),
            base_address = format_args!("{:#010x}", config.base_address),
            len = config.window_len,
            "Mapped watchdog register window"
        );

        Ok(Self {
            map,
            base_address: config.base_address,
            control_offset: config.control_offset,
            mode_offset: config.mode_offset,
        })
    }

    /// Physical base address of the mapping.
    #[must_use]
    pub fn base_address(&self) -> u64 {
        self.base_address
    }

    fn offset(&self, register: Register) -> usize {
        match register {
            Register::Control => self.control_offset,
            Register::Mode => self.mode_offset,
        }
    }
}

#[expect(
    unsafe_code,
    reason = "volatile stores into a memory-mapped device register"
)]
impl RegisterBlock for PhysicalWindow {
    fn write(&self, register: Register, value: u32) {
        let offset = self.offset(register);
        // SAFETY: `WatchdogConfig::validate` guarantees the offset is 4-byte
        // aligned and `offset + 4 <= window_len`, and `open` checked the
        // mapping is at least `window_len` long, so the result stays inside
        // the mapping.
        let target = unsafe { self.map.as_mut_ptr().add(offset) };
        // SAFETY: `target` is an aligned, in-bounds pointer into a live
        // shared mapping owned by `self`; device registers require volatile
        // access.
        unsafe { target.cast::<u32>().write_volatile(value) };
    }
}
