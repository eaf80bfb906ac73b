//! Error types for the watchdog supervision engine.
//!
//! Only start-up problems are errors. Liveness failures are not reported
//! through this type: they end the kick loop with
//! [`Termination::Expired`](crate::scheduler::Termination::Expired).

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while bringing up the watchdog.
#[derive(Debug, Error)]
pub enum WatchdogError {
    /// The physical memory device could not be opened.
    #[error("Failed to open memory device '{}': {source}", .path.display())]
    OpenMemDevice {
        /// Memory device path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The timer register window could not be mapped.
    #[error("Failed to map register window at {address:#010x} ({len} bytes): {source}")]
    MapWindow {
        /// Physical base address of the window.
        address: u64,
        /// Window length in bytes.
        len: usize,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl WatchdogError {
    /// Create an open memory device error.
    #[must_use]
    pub fn open_mem_device(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OpenMemDevice {
            path: path.into(),
            source,
        }
    }

    /// Create a map window error.
    #[must_use]
    pub fn map_window(address: u64, len: usize, source: std::io::Error) -> Self {
        Self::MapWindow {
            address,
            len,
            source,
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }

    /// Whether the error stems from missing privileges rather than a bad setup.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::OpenMemDevice { source, .. } | Self::MapWindow { source, .. } => {
                source.kind() == std::io::ErrorKind::PermissionDenied
            }
            Self::InvalidConfiguration(_) => false,
        }
    }
}

/// A specialized `Result` type for watchdog operations.
pub type WatchdogResult<T> = std::result::Result<T, WatchdogError>;
