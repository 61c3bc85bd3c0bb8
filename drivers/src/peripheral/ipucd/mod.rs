//! IP-UCD Timing Module Driver
//!
//! The IP-UCD is an Industry Pack module that watches the TCLK (and MDAT)
//! timing lines. Each incoming TCLK event code is looked up in a 256-entry
//! trigger map to decide which of its eight trigger lines fire. One trigger
//! line pushes the event into a hardware FIFO, tagged with the microseconds
//! elapsed since another trigger line last reset the timestamp counter.
//!
//! # Locking
//!
//! Both address windows live inside one [`IrqSpinLock`]. Register access is
//! only possible through a guard, so every operation is a complete register
//! sequence with no other access interleaved, whether it comes from a task
//! or from an interrupt handler.
//!
//! - [`IpUcd::lock`] masks interrupts and can be used from any context.
//! - [`IpUcd::lock_plain`] leaves interrupts alone. Use it inside an
//!   interrupt handler, or when the module is never serviced from one.
//!
//! The methods on [`IpUcd`] itself are conveniences that take the
//! interrupt-safe lock for a single operation.
//!
//! The interrupt controller defaults to [`PlatformIrq`]. On hosted targets
//! that is [`NoIrq`](common::sync::NoIrq), so `lock` masks nothing and
//! behaves like `lock_plain`. Bare-metal targets must supply a real
//! [`IrqControl`]; the build fails on those that have none.
//!
//! # Example
//!
//! ```no_run
//! use ipucd::peripheral::ipucd::{IpUcd, UcdConfig};
//!
//! let cfg = UcdConfig::new(0xffff_6000, 0x2000_0000)
//!     .write_fifo_trigger(1)
//!     .reset_timestamp_trigger(2);
//!
//! let ucd: IpUcd<_, _> = unsafe { IpUcd::map(&cfg)? };
//! ucd.adjust_tclk_reception(true, 0x02, 2)?;
//! ucd.adjust_tclk_reception(true, 0x0f, 1)?;
//!
//! let entry = ucd.read_fifo();
//! if entry.is_valid() {
//!     // entry.event(), entry.stamp()
//! }
//! # Ok::<(), ipucd::peripheral::ipucd::UcdError>(())
//! ```

pub mod config;
pub mod error;
pub mod fifo;

cfg_if::cfg_if! {
    if #[cfg(feature = "sim")] {
        pub mod sim;
        pub use sim::{SimModule, SimSpace};
    }
}

pub use config::UcdConfig;
pub use error::{Result, UcdError};
pub use fifo::FifoEntry;

use common::arch::PlatformIrq;
use common::sync::{IrqControl, IrqSpinLock, IrqSpinLockGuard};
use log::{debug, trace, warn};

use crate::hal::address_space::{AddressSpace, MmioSpace};
use crate::hal::register::{Readable, Register, Space, Width, Writable};
use crate::hw::ipucd::{
    self, A16_SIZE, A32_SIZE, ControlCommand, MAX_TRIGGER_BIT, MIN_FIFO_TRIGGER_BIT, MODULE_ID,
    Status, TRIGGER_ENTRIES,
};

/// MDAT capture buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MdatBuffer {
    Buffer0,
    Buffer1,
}

/// Check `bit` against `min..=MAX_TRIGGER_BIT`.
fn check_trigger_bit(bit: u8, min: u8) -> Result<u8> {
    if (min..=MAX_TRIGGER_BIT).contains(&bit) {
        Ok(bit)
    } else {
        Err(UcdError::InvalidTriggerBit {
            bit,
            min,
            max: MAX_TRIGGER_BIT,
        })
    }
}

pub(crate) fn check_threshold(level: u8) -> Result<u8> {
    if level > 0 {
        Ok(level)
    } else {
        Err(UcdError::InvalidThreshold(level))
    }
}

pub(crate) fn check_fifo_trigger(bit: u8) -> Result<u8> {
    check_trigger_bit(bit, MIN_FIFO_TRIGGER_BIT)
}

/// Decode a FIFO write/clear select: 0 is off, otherwise `bit + 1`.
fn decode_fifo_trigger(select: u8) -> Option<u8> {
    select.checked_sub(1)
}

/// The module's register windows. Only reachable through a lock guard.
pub struct UcdRegisters<A16, A32> {
    a16: A16,
    a32: A32,
}

impl<A16: AddressSpace, A32: AddressSpace> UcdRegisters<A16, A32> {
    fn bus(&mut self, space: Space) -> &mut dyn AddressSpace {
        match space {
            Space::A16 => &mut self.a16,
            Space::A32 => &mut self.a32,
        }
    }

    fn get<W: Width, A: Readable>(&mut self, reg: &Register<W, A>) -> W {
        reg.read(self.bus(reg.space()))
    }

    fn set<W: Width, A: Writable>(&mut self, reg: &Register<W, A>, value: W) {
        reg.write(self.bus(reg.space()), value)
    }

    /// Reset and bring up the module.
    ///
    /// The identity check comes first: a module that is not an IP-UCD is
    /// never written to.
    fn initialize(&mut self) -> Result<()> {
        let found = self.module_id();
        if found != MODULE_ID {
            warn!("IP-UCD: unexpected module id {:#06x}", found);
            return Err(UcdError::NotFound {
                found,
                expected: MODULE_ID,
            });
        }

        debug!("IP-UCD: module found, resetting");
        self.command(ControlCommand::SwReset);

        // Clear trigger memory.
        self.set(&ipucd::FIFO_WRITE, 0);
        self.set(&ipucd::FIFO_CLEAR, 0);

        let bus = self.bus(ipucd::TRIGGER.space());
        for event in 0..TRIGGER_ENTRIES {
            ipucd::TRIGGER.write_element(&mut *bus, event, 0);
        }
        debug!("IP-UCD: trigger map cleared");

        self.command(ControlCommand::EnableTclk);
        debug!("IP-UCD: TCLK capture enabled");
        Ok(())
    }

    /// Identifier from the Industry Pack PROM.
    pub fn module_id(&mut self) -> u16 {
        let high = self.get(&ipucd::PROM_ID_HIGH) as u16;
        let low = self.get(&ipucd::PROM_ID_LOW) as u16;
        (high << 8) | low
    }

    /// Write a command to the control register.
    pub fn command(&mut self, cmd: ControlCommand) {
        trace!("IP-UCD: command {:?}", cmd);
        self.set(&ipucd::CONTROL, cmd.bits());
    }

    pub fn enable_tclk(&mut self) {
        self.command(ControlCommand::EnableTclk);
    }

    pub fn disable_tclk(&mut self) {
        self.command(ControlCommand::DisableTclk);
    }

    pub fn enable_mdat(&mut self) {
        self.command(ControlCommand::EnableMdat);
    }

    pub fn disable_mdat(&mut self) {
        self.command(ControlCommand::DisableMdat);
    }

    pub fn select_mdat_buffer(&mut self, buffer: MdatBuffer) {
        self.command(match buffer {
            MdatBuffer::Buffer0 => ControlCommand::MdatBuf0,
            MdatBuffer::Buffer1 => ControlCommand::MdatBuf1,
        });
    }

    /// Enable or disable automatic MDAT buffer switching.
    pub fn set_mdat_auto_buffer(&mut self, enable: bool) {
        self.command(if enable {
            ControlCommand::EnableMdatBufAuto
        } else {
            ControlCommand::DisableMdatBufAuto
        });
    }

    /// Make the module raise its interrupt.
    pub fn software_interrupt(&mut self) {
        self.command(ControlCommand::SwInterrupt);
    }

    /// Set the FIFO fill level that raises `FIFO_THRESHOLD`.
    ///
    /// The register is 16 bits wide but only accepts 1..=255.
    pub fn set_fifo_threshold(&mut self, level: u8) -> Result<()> {
        let level = check_threshold(level)?;
        self.set(&ipucd::FIFO_THRESHOLD, level as u16);
        Ok(())
    }

    pub fn fifo_threshold(&mut self) -> u16 {
        self.get(&ipucd::FIFO_THRESHOLD)
    }

    /// Route (or stop routing) TCLK `event` to trigger line `trig_bit`.
    pub fn adjust_tclk_reception(&mut self, enable: bool, event: u8, trig_bit: u8) -> Result<()> {
        let bit = check_trigger_bit(trig_bit, 0)?;
        let mask = 1u16 << bit;

        let bus = self.bus(ipucd::TRIGGER.space());
        let prev = ipucd::TRIGGER.read_element(&mut *bus, event as usize);
        let value = if enable { prev | mask } else { prev & !mask };
        ipucd::TRIGGER.write_element(bus, event as usize, value);
        Ok(())
    }

    /// Whether TCLK `event` fires trigger line `trig_bit`.
    pub fn tclk_reception(&mut self, event: u8, trig_bit: u8) -> Result<bool> {
        let bit = check_trigger_bit(trig_bit, 0)?;
        let mask = 1u16 << bit;

        let bus = self.bus(ipucd::TRIGGER.space());
        Ok(ipucd::TRIGGER.read_element(bus, event as usize) & mask != 0)
    }

    /// Select the trigger line that resets the FIFO timestamp counter.
    pub fn set_reset_fifo_timestamp_trigger(&mut self, trig_bit: u8) -> Result<()> {
        let bit = check_fifo_trigger(trig_bit)?;
        self.set(&ipucd::FIFO_CLEAR, bit + 1);
        Ok(())
    }

    /// Trigger line that resets the FIFO timestamp counter, if any.
    pub fn reset_fifo_timestamp_trigger(&mut self) -> Option<u8> {
        decode_fifo_trigger(self.get(&ipucd::FIFO_CLEAR))
    }

    /// Select the trigger line that pushes events into the FIFO.
    pub fn set_write_fifo_trigger(&mut self, trig_bit: u8) -> Result<()> {
        let bit = check_fifo_trigger(trig_bit)?;
        self.set(&ipucd::FIFO_WRITE, bit + 1);
        Ok(())
    }

    /// Trigger line that pushes events into the FIFO, if any.
    pub fn write_fifo_trigger(&mut self) -> Option<u8> {
        decode_fifo_trigger(self.get(&ipucd::FIFO_WRITE))
    }

    pub fn mdat_interrupt_type(&mut self) -> u8 {
        self.get(&ipucd::MDAT_INT_TYPE)
    }

    pub fn set_mdat_interrupt_type(&mut self, value: u8) {
        self.set(&ipucd::MDAT_INT_TYPE, value);
    }

    pub fn mdat_buffer_switch(&mut self) -> u8 {
        self.get(&ipucd::MDAT_BUF_SWITCH)
    }

    pub fn set_mdat_buffer_switch(&mut self, value: u8) {
        self.set(&ipucd::MDAT_BUF_SWITCH, value);
    }

    /// Fast-time-plot timestamp.
    pub fn ftp_timestamp(&mut self) -> u32 {
        ipucd::FTP_TIMESTAMP.read(self.bus(ipucd::FTP_TIMESTAMP.space()))
    }

    /// Read the status register and clear its latched bits.
    ///
    /// The value read is written straight back, inside the same lock hold,
    /// which acknowledges the latched error and threshold conditions.
    pub fn status(&mut self) -> Status {
        let raw = self.get(&ipucd::STATUS);
        self.set(&ipucd::STATUS, raw);

        let status = Status::from_bits_retain(raw);
        trace!("IP-UCD: status {:?}", status);
        if status.has_errors() {
            warn!("IP-UCD: error condition {:?}", status & Status::ERRORS);
        }
        status
    }

    /// Pop the oldest FIFO entry.
    ///
    /// Returns an invalid entry (see [`FifoEntry::is_valid`]) when the FIFO
    /// is empty; the FIFO itself is not touched in that case. The emptiness
    /// check and the pop are separate bus cycles, so an event captured in
    /// between is simply picked up by the next call.
    pub fn read_fifo(&mut self) -> FifoEntry {
        let status = Status::from_bits_retain(self.get(&ipucd::STATUS));
        if !status.fifo_has_data() {
            return FifoEntry::empty();
        }

        let word = ipucd::FIFO.read(self.bus(ipucd::FIFO.space()));
        let entry = FifoEntry::from(word);
        trace!("IP-UCD: popped {:?}", entry);
        entry
    }

    /// Pop entries into `out` until the FIFO is empty or `out` is full.
    ///
    /// Returns the number of entries written.
    pub fn drain_fifo(&mut self, out: &mut [FifoEntry]) -> usize {
        let mut count = 0;
        for slot in out.iter_mut() {
            let entry = self.read_fifo();
            if !entry.is_valid() {
                break;
            }
            *slot = entry;
            count += 1;
        }
        count
    }

    fn apply(&mut self, cfg: &UcdConfig) -> Result<()> {
        if let Some(level) = cfg.fifo_threshold {
            self.set_fifo_threshold(level)?;
        }
        if let Some(bit) = cfg.write_fifo_trigger {
            self.set_write_fifo_trigger(bit)?;
        }
        if let Some(bit) = cfg.reset_timestamp_trigger {
            self.set_reset_fifo_timestamp_trigger(bit)?;
        }
        Ok(())
    }
}

/// Guard giving exclusive access to an IP-UCD's registers.
pub type UcdGuard<'a, A16, A32, I> = IrqSpinLockGuard<'a, UcdRegisters<A16, A32>, I>;

/// IP-UCD driver.
///
/// Owns the module's A16 and A32 windows for its whole lifetime. An
/// instance only exists once the module has been identified and reset.
pub struct IpUcd<A16, A32, I: IrqControl = PlatformIrq> {
    regs: IrqSpinLock<UcdRegisters<A16, A32>, I>,
}

impl<A16: AddressSpace, A32: AddressSpace, I: IrqControl> IpUcd<A16, A32, I> {
    /// Identify, reset and start the module.
    ///
    /// The lock is held for the whole sequence: read the PROM id, issue a
    /// software reset, clear both FIFO trigger selects and the trigger map,
    /// then enable TCLK capture.
    ///
    /// # Errors
    ///
    /// [`UcdError::NotFound`] if the PROM does not identify an IP-UCD. In
    /// that case nothing has been written.
    pub fn new(a16: A16, a32: A32) -> Result<Self> {
        let ucd = Self {
            regs: IrqSpinLock::new(UcdRegisters { a16, a32 }),
        };
        ucd.lock().initialize()?;
        Ok(ucd)
    }

    /// Construct, then apply the optional settings in `cfg`.
    ///
    /// The settings are range-checked before the module is touched.
    pub fn with_config(a16: A16, a32: A32, cfg: &UcdConfig) -> Result<Self> {
        cfg.validate()?;
        let ucd = Self::new(a16, a32)?;
        ucd.lock().apply(cfg)?;
        Ok(ucd)
    }

    /// Acquire the device with interrupts masked.
    pub fn lock(&self) -> UcdGuard<'_, A16, A32, I> {
        self.regs.lock()
    }

    /// Acquire the device without touching the interrupt state.
    pub fn lock_plain(&self) -> UcdGuard<'_, A16, A32, I> {
        self.regs.lock_plain()
    }

    /// Acquire the device if nobody holds it.
    pub fn try_lock(&self) -> Option<UcdGuard<'_, A16, A32, I>> {
        self.regs.try_lock()
    }

    pub fn module_id(&self) -> u16 {
        self.lock().module_id()
    }

    pub fn command(&self, cmd: ControlCommand) {
        self.lock().command(cmd)
    }

    pub fn set_fifo_threshold(&self, level: u8) -> Result<()> {
        self.lock().set_fifo_threshold(level)
    }

    pub fn adjust_tclk_reception(&self, enable: bool, event: u8, trig_bit: u8) -> Result<()> {
        self.lock().adjust_tclk_reception(enable, event, trig_bit)
    }

    pub fn tclk_reception(&self, event: u8, trig_bit: u8) -> Result<bool> {
        self.lock().tclk_reception(event, trig_bit)
    }

    pub fn set_reset_fifo_timestamp_trigger(&self, trig_bit: u8) -> Result<()> {
        self.lock().set_reset_fifo_timestamp_trigger(trig_bit)
    }

    pub fn set_write_fifo_trigger(&self, trig_bit: u8) -> Result<()> {
        self.lock().set_write_fifo_trigger(trig_bit)
    }

    pub fn status(&self) -> Status {
        self.lock().status()
    }

    pub fn read_fifo(&self) -> FifoEntry {
        self.lock().read_fifo()
    }

    pub fn drain_fifo(&self, out: &mut [FifoEntry]) -> usize {
        self.lock().drain_fifo(out)
    }
}

impl<I: IrqControl> IpUcd<MmioSpace, MmioSpace, I> {
    /// Bind to a module mapped at the bases in `cfg`.
    ///
    /// # Safety
    ///
    /// - `cfg.a16_base` and `cfg.a32_base` must be mapped as device memory
    ///   covering the module's A16 and A32 windows
    /// - Only one driver instance should exist per module
    pub unsafe fn map(cfg: &UcdConfig) -> Result<Self> {
        let a16 = unsafe { MmioSpace::new(cfg.a16_base, A16_SIZE) };
        let a32 = unsafe { MmioSpace::new(cfg.a32_base, A32_SIZE) };
        Self::with_config(a16, a32, cfg)
    }
}
