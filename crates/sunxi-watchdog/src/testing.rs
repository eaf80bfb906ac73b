//! Test doubles for hardware-free runs.

use crate::device::{Register, RegisterBlock};
use crate::scheduler::{Ticker, Wake};
use parking_lot::Mutex;
use std::sync::Arc;

/// Register block that records every write in order.
///
/// Clones share the same log, so one clone can be moved into a scheduler
/// thread while another is inspected.
#[derive(Debug, Clone, Default)]
pub struct RecordingRegisters {
    writes: Arc<Mutex<Vec<(Register, u32)>>>,
}

impl RecordingRegisters {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All writes so far.
    #[must_use]
    pub fn writes(&self) -> Vec<(Register, u32)> {
        self.writes.lock().clone()
    }

    /// Most recent write.
    #[must_use]
    pub fn last(&self) -> Option<(Register, u32)> {
        self.writes.lock().last().copied()
    }

    /// Number of writes to `register`.
    #[must_use]
    pub fn count(&self, register: Register) -> usize {
        self.writes
            .lock()
            .iter()
            .filter(|(target, _)| *target == register)
            .count()
    }

    /// Value the hardware would currently hold in `register`.
    #[must_use]
    pub fn value(&self, register: Register) -> Option<u32> {
        self.writes
            .lock()
            .iter()
            .rev()
            .find(|(target, _)| *target == register)
            .map(|(_, value)| *value)
    }
}

impl RegisterBlock for RecordingRegisters {
    fn write(&self, register: Register, value: u32) {
        self.writes.lock().push((register, value));
    }
}

/// Ticker that never sleeps.
///
/// Every wait elapses immediately, except that the wait numbered
/// `interrupt_at` (1-based) reports [`Wake::Interrupted`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedTicker {
    waits: u64,
    interrupt_at: Option<u64>,
}

impl ScriptedTicker {
    /// Ticker that is never interrupted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `elapsed` waits pass, then interrupt the next one.
    #[must_use]
    pub fn interrupt_after(elapsed: u64) -> Self {
        Self {
            waits: 0,
            interrupt_at: Some(elapsed.saturating_add(1)),
        }
    }

    /// Number of waits performed.
    #[must_use]
    pub fn waits(&self) -> u64 {
        self.waits
    }
}

impl Ticker for ScriptedTicker {
    fn wait(&mut self) -> Wake {
        self.waits = self.waits.saturating_add(1);
        if self.interrupt_at == Some(self.waits) {
            Wake::Interrupted
        } else {
            Wake::Elapsed
        }
    }
}
