use thiserror::Error;

/// Errors reported by the IP-UCD driver.
///
/// Configuration errors are caller mistakes. They are detected before any
/// register is touched. `NotFound` is fatal to the instance being built.
/// FIFO and parity conditions are not errors; they show up in
/// [`Status`](crate::hw::ipucd::Status).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum UcdError {
    #[error("illegal FIFO threshold value {0} (valid range 1..=255)")]
    InvalidThreshold(u8),

    #[error("illegal trigger bit value {bit} (valid range {min}..={max})")]
    InvalidTriggerBit { bit: u8, min: u8, max: u8 },

    #[error("IP-UCD not found: module id {found:#06x}, expected {expected:#06x}")]
    NotFound { found: u16, expected: u16 },
}

impl UcdError {
    /// Whether the caller passed an out-of-range parameter.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            UcdError::InvalidThreshold(_) | UcdError::InvalidTriggerBit { .. }
        )
    }
}

pub type Result<T> = core::result::Result<T, UcdError>;
