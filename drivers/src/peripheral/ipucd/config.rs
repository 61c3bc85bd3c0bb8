//! Construction parameters.

use super::error::Result;
use super::{check_fifo_trigger, check_threshold};

/// Where the module is mapped and how to configure it after reset.
///
/// The optional settings are applied by
/// [`IpUcd::with_config`](super::IpUcd::with_config) once the reset sequence
/// has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UcdConfig {
    /// Virtual address of the module's A16 (control/status) window.
    pub a16_base: usize,
    /// Virtual address of the module's A32 (trigger map/FIFO) window.
    pub a32_base: usize,
    /// FIFO fill level that raises `FIFO_THRESHOLD`.
    pub fifo_threshold: Option<u8>,
    /// Trigger line that pushes an event into the FIFO.
    pub write_fifo_trigger: Option<u8>,
    /// Trigger line that resets the FIFO timestamp base.
    pub reset_timestamp_trigger: Option<u8>,
}

impl UcdConfig {
    pub const fn new(a16_base: usize, a32_base: usize) -> Self {
        Self {
            a16_base,
            a32_base,
            fifo_threshold: None,
            write_fifo_trigger: None,
            reset_timestamp_trigger: None,
        }
    }

    pub const fn fifo_threshold(mut self, level: u8) -> Self {
        self.fifo_threshold = Some(level);
        self
    }

    pub const fn write_fifo_trigger(mut self, trig_bit: u8) -> Self {
        self.write_fifo_trigger = Some(trig_bit);
        self
    }

    pub const fn reset_timestamp_trigger(mut self, trig_bit: u8) -> Self {
        self.reset_timestamp_trigger = Some(trig_bit);
        self
    }

    /// Range-check the optional settings without touching hardware.
    pub fn validate(&self) -> Result<()> {
        if let Some(level) = self.fifo_threshold {
            check_threshold(level)?;
        }
        if let Some(bit) = self.write_fifo_trigger {
            check_fifo_trigger(bit)?;
        }
        if let Some(bit) = self.reset_timestamp_trigger {
            check_fifo_trigger(bit)?;
        }
        Ok(())
    }
}
