//! Address Space Hardware Abstraction Layer.
//!
//! An address space is one window of a bus (for example the A16 or A32
//! space of a VME carrier) in which a module's registers are mapped. All
//! offsets are byte offsets relative to the start of the window.

use core::ptr::{read_volatile, write_volatile};

/// Width-aware access to a memory-mapped register window.
///
/// Accesses take `&mut self`: a driver owns its windows and hands them out
/// only while its lock is held.
pub trait AddressSpace {
    /// Read one byte.
    fn read8(&mut self, offset: usize) -> u8;

    /// Read one 16-bit word.
    fn read16(&mut self, offset: usize) -> u16;

    /// Write one byte.
    fn write8(&mut self, offset: usize, value: u8);

    /// Write one 16-bit word.
    fn write16(&mut self, offset: usize, value: u16);

    /// Destructive 16-bit read: the device drops the value once read.
    ///
    /// On real hardware this is an ordinary load with side effects, so the
    /// default forwards to `read16`. Simulators override it to model the
    /// queue behind the register.
    fn pop16(&mut self, offset: usize) -> u16 {
        self.read16(offset)
    }
}

/// Volatile access to a window mapped at a fixed virtual address.
#[derive(Debug)]
pub struct MmioSpace {
    base: usize,
    size: usize,
}

impl MmioSpace {
    /// Create a handle for the window at `base`, `size` bytes long.
    ///
    /// # Safety
    ///
    /// - `base..base + size` must be mapped as device memory
    /// - Only one handle should exist per window
    pub const unsafe fn new(base: usize, size: usize) -> Self {
        Self { base, size }
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn addr(&self, offset: usize, width: usize) -> usize {
        debug_assert!(
            offset + width <= self.size,
            "offset {offset:#x} outside {:#x}-byte window",
            self.size
        );
        self.base + offset
    }
}

impl AddressSpace for MmioSpace {
    #[inline]
    fn read8(&mut self, offset: usize) -> u8 {
        unsafe { read_volatile(self.addr(offset, 1) as *const u8) }
    }

    #[inline]
    fn read16(&mut self, offset: usize) -> u16 {
        unsafe { read_volatile(self.addr(offset, 2) as *const u16) }
    }

    #[inline]
    fn write8(&mut self, offset: usize, value: u8) {
        unsafe { write_volatile(self.addr(offset, 1) as *mut u8, value) }
    }

    #[inline]
    fn write16(&mut self, offset: usize, value: u16) {
        unsafe { write_volatile(self.addr(offset, 2) as *mut u16, value) }
    }
}
