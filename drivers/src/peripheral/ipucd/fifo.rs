//! Captured FIFO entries.

use core::fmt;

/// One event popped from the module's FIFO.
///
/// The hardware word holds the microsecond count since the last timestamp
/// reset event (typically `$02`) in bits 31..8 and the TCLK event code in
/// bits 7..0. The all-ones word never comes from the hardware and is used
/// as "no entry".
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FifoEntry(u32);

impl FifoEntry {
    const NO_VALUE: u32 = 0xffff_ffff;

    /// An entry that carries no event.
    pub const fn empty() -> Self {
        Self(Self::NO_VALUE)
    }

    /// Combine the two 16-bit FIFO words, high word first.
    pub const fn from_words(high: u16, low: u16) -> Self {
        Self(((high as u32) << 16) | low as u32)
    }

    /// TCLK event code.
    pub const fn event(self) -> u8 {
        self.0 as u8
    }

    /// Microseconds since the last timestamp reset. Wraps at 2^24.
    pub const fn stamp(self) -> u32 {
        self.0 >> 8
    }

    pub const fn is_valid(self) -> bool {
        self.0 != Self::NO_VALUE
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl Default for FifoEntry {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<u32> for FifoEntry {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Debug for FifoEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            f.debug_struct("FifoEntry")
                .field("event", &format_args!("{:#04x}", self.event()))
                .field("stamp", &self.stamp())
                .finish()
        } else {
            f.write_str("FifoEntry(empty)")
        }
    }
}
