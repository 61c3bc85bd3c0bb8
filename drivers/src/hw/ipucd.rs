//! IP-UCD register map.
//!
//! The module decodes two windows on its carrier: a 256-byte A16 window for
//! identification, control and status, and an 8 KiB A32 window holding the
//! trigger map and the event FIFO. Offsets here are bit-exact and must not
//! change.

use crate::hal::register::{
    Confirmed, Destructive, ReadOnly, Register, RegisterArray, Space, Span, WordPair,
    spans_disjoint,
};

/// Size of the A16 (control/status) window in bytes.
pub const A16_SIZE: usize = 0x100;
/// Size of the A32 (trigger map/FIFO) window in bytes.
pub const A32_SIZE: usize = 0x2000;

/// Module identifier stored in the Industry Pack PROM.
pub const MODULE_ID: u16 = 0xbb15;

/// Number of event codes, and so of trigger map entries.
pub const TRIGGER_ENTRIES: usize = 256;
/// Highest usable trigger line.
pub const MAX_TRIGGER_BIT: u8 = 7;
/// Lowest trigger line the FIFO write/clear selects accept; 0 is reserved.
pub const MIN_FIFO_TRIGGER_BIT: u8 = 1;

// PROM (read-only identification bytes)
pub const PROM_ID_HIGH: Register<u8, ReadOnly> = Register::new(Space::A16, 0x89);
pub const PROM_ID_LOW: Register<u8, ReadOnly> = Register::new(Space::A16, 0x8b);

// A16 control and status
pub const CONTROL: Register<u16, Confirmed> = Register::new(Space::A16, 0x40);
pub const STATUS: Register<u16, Confirmed> = Register::new(Space::A16, 0x42);
pub const MDAT_INT_TYPE: Register<u8, Confirmed> = Register::new(Space::A16, 0x44);
pub const MDAT_BUF_SWITCH: Register<u8, Confirmed> = Register::new(Space::A16, 0x45);
pub const FTP_TS_LOW: Register<u16, Confirmed> = Register::new(Space::A16, 0x46);
pub const FTP_TS_HIGH: Register<u16, Confirmed> = Register::new(Space::A16, 0x48);
/// Trigger select for FIFO writes, encoded `trigger bit + 1` (0 = off).
pub const FIFO_WRITE: Register<u8, Confirmed> = Register::new(Space::A16, 0x4a);
/// Trigger select for FIFO timestamp resets, encoded `trigger bit + 1` (0 = off).
pub const FIFO_CLEAR: Register<u8, Confirmed> = Register::new(Space::A16, 0x4b);
/// FIFO fill threshold; valid range 1..=255.
pub const FIFO_THRESHOLD: Register<u16, Confirmed> = Register::new(Space::A16, 0x4c);

/// Fast-time-plot timestamp as one value (high word at 0x48, low at 0x46).
pub const FTP_TIMESTAMP: WordPair<Confirmed> =
    WordPair::split(Space::A16, FTP_TS_HIGH.offset(), FTP_TS_LOW.offset());

// A32 trigger map and FIFO
pub const TRIGGER: RegisterArray<u16, Confirmed, TRIGGER_ENTRIES> =
    RegisterArray::new(Space::A32, 0x0000);
/// Event FIFO: two destructive 16-bit reads, high word first.
pub const FIFO: WordPair<Destructive> = WordPair::adjacent(Space::A32, 0x1200);

/// Every distinct location on the module. `FTP_TIMESTAMP` is left out
/// because it aliases `FTP_TS_LOW`/`FTP_TS_HIGH`.
pub const LAYOUT: [Span; 13] = [
    PROM_ID_HIGH.span(),
    PROM_ID_LOW.span(),
    CONTROL.span(),
    STATUS.span(),
    MDAT_INT_TYPE.span(),
    MDAT_BUF_SWITCH.span(),
    FTP_TS_LOW.span(),
    FTP_TS_HIGH.span(),
    FIFO_WRITE.span(),
    FIFO_CLEAR.span(),
    FIFO_THRESHOLD.span(),
    TRIGGER.span(),
    FIFO.span(),
];

const fn layout_fits() -> bool {
    let mut i = 0;
    while i < LAYOUT.len() {
        let span = &LAYOUT[i];
        let size = match span.space {
            Space::A16 => A16_SIZE,
            Space::A32 => A32_SIZE,
        };
        if !span.fits(size) {
            return false;
        }
        i += 1;
    }
    true
}

const _: () = assert!(spans_disjoint(&LAYOUT), "IP-UCD registers overlap");
const _: () = assert!(layout_fits(), "IP-UCD register outside its window");

/// Commands accepted by the control register.
#[repr(u16)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    NoOp = 0x0,
    EnableTclk = 0x1,
    DisableTclk = 0x2,
    EnableMdat = 0x3,
    DisableMdat = 0x4,
    MdatBuf0 = 0x5,
    MdatBuf1 = 0x6,
    EnableMdatBufAuto = 0x7,
    DisableMdatBufAuto = 0x8,
    SwInterrupt = 0x9,
    SwReset = 0xff,
}

impl ControlCommand {
    pub const fn bits(self) -> u16 {
        self as u16
    }
}

bitflags::bitflags! {
    /// Status register contents.
    ///
    /// Error and FIFO-level bits are latched; writing the value read back to
    /// the register clears them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u16 {
        const MDAT_PARITY_ERROR = 0x4000;
        /// Set while MDAT buffer 1 is active, clear for buffer 0.
        const MDAT_BUFFER_1 = 0x2000;
        const FIFO_UNDERFLOW = 0x1000;
        const FIFO_OVERFLOW = 0x0800;
        const FIFO_FULL = 0x0400;
        const FIFO_THRESHOLD = 0x0200;
        const FIFO_EMPTY = 0x0100;
        const TCLK_PARITY_ERROR = 0x0080;
        const MDAT_BUFFER1_ENABLED = 0x0040;
        const MDAT_BUFFER0_ENABLED = 0x0020;
        const MDAT_AUTO_BUFFER_ENABLED = 0x0010;
        const MDAT_ENABLED = 0x0008;
        const TCLK_ENABLED = 0x0004;
        const MDAT_PRESENT = 0x0002;
        const TCLK_PRESENT = 0x0001;
    }
}

impl Status {
    /// Conditions that indicate lost or corrupted data.
    pub const ERRORS: Status = Status::MDAT_PARITY_ERROR
        .union(Status::TCLK_PARITY_ERROR)
        .union(Status::FIFO_OVERFLOW)
        .union(Status::FIFO_UNDERFLOW);

    pub fn has_errors(self) -> bool {
        self.intersects(Self::ERRORS)
    }

    pub fn fifo_has_data(self) -> bool {
        !self.contains(Self::FIFO_EMPTY)
    }
}
