//! Software model of an IP-UCD module.
//!
//! [`SimModule`] stands in for the hardware behind both address windows. It
//! keeps register contents, models the read-to-clear status register and the
//! two-word FIFO, and records every bus access so tests can check the exact
//! sequence a driver operation issues.
//!
//! ```ignore
//! let module = SimModule::new();
//! let ucd: IpUcd<_, _, NoIrq> = IpUcd::new(module.a16(), module.a32())?;
//! module.push_event(0x0000_0a02);
//! assert_eq!(ucd.read_fifo().event(), 0x02);
//! ```

use alloc::collections::{BTreeMap, VecDeque};
use alloc::sync::Arc;
use alloc::vec::Vec;
use spin::Mutex;

use crate::hal::address_space::AddressSpace;
use crate::hal::register::Space;
use crate::hw::ipucd::{self, ControlCommand, MODULE_ID, Status};

/// Status bits that stay set until written back.
const LATCHED: Status = Status::ERRORS
    .union(Status::FIFO_THRESHOLD)
    .union(Status::FIFO_FULL);

/// Kind of bus cycle seen by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
    /// Destructive read.
    Pop,
}

/// One recorded bus cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub space: Space,
    pub kind: AccessKind,
    pub offset: usize,
    /// Access width in bytes.
    pub width: u8,
    pub value: u16,
}

impl Access {
    pub fn is_write(&self) -> bool {
        self.kind == AccessKind::Write
    }
}

struct State {
    a16: BTreeMap<usize, u16>,
    a32: BTreeMap<usize, u16>,
    status: Status,
    fifo: VecDeque<u32>,
    fifo_depth: usize,
    /// Low word of the entry whose high word has already been popped.
    pending_low: Option<u16>,
    log: Vec<Access>,
}

impl State {
    fn window(&mut self, space: Space) -> &mut BTreeMap<usize, u16> {
        match space {
            Space::A16 => &mut self.a16,
            Space::A32 => &mut self.a32,
        }
    }

    fn record(&mut self, space: Space, kind: AccessKind, offset: usize, width: u8, value: u16) {
        self.log.push(Access {
            space,
            kind,
            offset,
            width,
            value,
        });
    }

    fn status_word(&self) -> u16 {
        let mut status = self.status;
        status.set(Status::FIFO_EMPTY, self.fifo.is_empty() && self.pending_low.is_none());
        status.bits()
    }

    fn load(&mut self, space: Space, offset: usize) -> u16 {
        if space == Space::A16 && offset == ipucd::STATUS.offset() {
            return self.status_word();
        }
        self.window(space).get(&offset).copied().unwrap_or(0)
    }

    fn store(&mut self, space: Space, offset: usize, value: u16) {
        if space == Space::A16 && offset == ipucd::STATUS.offset() {
            let clear = Status::from_bits_retain(value) & LATCHED;
            self.status.remove(clear);
            return;
        }
        if space == Space::A16 && offset == ipucd::CONTROL.offset() {
            self.command(value);
        }
        self.window(space).insert(offset, value);
    }

    fn command(&mut self, value: u16) {
        let status = &mut self.status;
        match value {
            v if v == ControlCommand::SwReset.bits() => {
                *status &= Status::TCLK_PRESENT | Status::MDAT_PRESENT;
                self.fifo.clear();
                self.pending_low = None;
            }
            v if v == ControlCommand::EnableTclk.bits() => status.insert(Status::TCLK_ENABLED),
            v if v == ControlCommand::DisableTclk.bits() => status.remove(Status::TCLK_ENABLED),
            v if v == ControlCommand::EnableMdat.bits() => status.insert(Status::MDAT_ENABLED),
            v if v == ControlCommand::DisableMdat.bits() => status.remove(Status::MDAT_ENABLED),
            v if v == ControlCommand::MdatBuf0.bits() => {
                status.remove(Status::MDAT_BUFFER_1 | Status::MDAT_BUFFER1_ENABLED);
                status.insert(Status::MDAT_BUFFER0_ENABLED);
            }
            v if v == ControlCommand::MdatBuf1.bits() => {
                status.remove(Status::MDAT_BUFFER0_ENABLED);
                status.insert(Status::MDAT_BUFFER_1 | Status::MDAT_BUFFER1_ENABLED);
            }
            v if v == ControlCommand::EnableMdatBufAuto.bits() => {
                status.insert(Status::MDAT_AUTO_BUFFER_ENABLED)
            }
            v if v == ControlCommand::DisableMdatBufAuto.bits() => {
                status.remove(Status::MDAT_AUTO_BUFFER_ENABLED)
            }
            _ => {}
        }
    }

    fn pop(&mut self, space: Space, offset: usize) -> u16 {
        let fifo = ipucd::FIFO.span();
        if space != fifo.space || offset < fifo.start || offset >= fifo.end {
            return self.load(space, offset);
        }

        match self.pending_low.take() {
            Some(low) => low,
            None => match self.fifo.pop_front() {
                Some(word) => {
                    self.pending_low = Some(word as u16);
                    (word >> 16) as u16
                }
                None => {
                    self.status.insert(Status::FIFO_UNDERFLOW);
                    self.pending_low = Some(0xffff);
                    0xffff
                }
            },
        }
    }
}

/// A simulated IP-UCD. Clones share the same module.
#[derive(Clone)]
pub struct SimModule {
    state: Arc<Mutex<State>>,
}

impl SimModule {
    /// A module that answers with the genuine IP-UCD identifier.
    pub fn new() -> Self {
        Self::with_module_id(MODULE_ID)
    }

    /// A module whose PROM reports `id`.
    pub fn with_module_id(id: u16) -> Self {
        let mut a16 = BTreeMap::new();
        a16.insert(ipucd::PROM_ID_HIGH.offset(), id >> 8);
        a16.insert(ipucd::PROM_ID_LOW.offset(), id & 0xff);

        Self {
            state: Arc::new(Mutex::new(State {
                a16,
                a32: BTreeMap::new(),
                status: Status::TCLK_PRESENT | Status::MDAT_PRESENT,
                fifo: VecDeque::new(),
                fifo_depth: usize::MAX,
                pending_low: None,
                log: Vec::new(),
            })),
        }
    }

    /// Limit the FIFO to `depth` entries; pushes beyond it set `FIFO_OVERFLOW`.
    pub fn with_fifo_depth(self, depth: usize) -> Self {
        self.state.lock().fifo_depth = depth;
        self
    }

    /// Handle for the A16 window.
    pub fn a16(&self) -> SimSpace {
        SimSpace {
            module: self.clone(),
            space: Space::A16,
        }
    }

    /// Handle for the A32 window.
    pub fn a32(&self) -> SimSpace {
        SimSpace {
            module: self.clone(),
            space: Space::A32,
        }
    }

    /// Capture an event, as the hardware does when a routed trigger fires.
    pub fn push_event(&self, word: u32) {
        let mut state = self.state.lock();
        if state.fifo.len() >= state.fifo_depth {
            state.status.insert(Status::FIFO_OVERFLOW);
            return;
        }
        state.fifo.push_back(word);
        if state.fifo.len() == state.fifo_depth {
            state.status.insert(Status::FIFO_FULL);
        }
        let threshold = state.a16.get(&ipucd::FIFO_THRESHOLD.offset()).copied();
        if threshold.is_some_and(|t| t > 0 && state.fifo.len() >= t as usize) {
            state.status.insert(Status::FIFO_THRESHOLD);
        }
    }

    /// Latch status bits, e.g. a parity error seen on the TCLK line.
    pub fn raise(&self, bits: Status) {
        self.state.lock().status.insert(bits);
    }

    /// Current status as the driver would read it, without recording an access.
    pub fn status(&self) -> Status {
        Status::from_bits_retain(self.state.lock().status_word())
    }

    pub fn fifo_len(&self) -> usize {
        self.state.lock().fifo.len()
    }

    /// Register contents, without recording an access.
    pub fn peek(&self, space: Space, offset: usize) -> u16 {
        self.state.lock().load(space, offset)
    }

    /// Trigger map entry for `event`, without recording an access.
    pub fn trigger(&self, event: u8) -> u16 {
        self.peek(Space::A32, ipucd::TRIGGER.element_offset(event as usize))
    }

    /// Set a trigger map entry behind the driver's back.
    pub fn set_trigger(&self, event: u8, mask: u16) {
        let offset = ipucd::TRIGGER.element_offset(event as usize);
        self.state.lock().a32.insert(offset, mask);
    }

    /// Every access recorded so far.
    pub fn accesses(&self) -> Vec<Access> {
        self.state.lock().log.clone()
    }

    /// Recorded writes only.
    pub fn writes(&self) -> Vec<Access> {
        self.state
            .lock()
            .log
            .iter()
            .filter(|a| a.is_write())
            .copied()
            .collect()
    }

    pub fn clear_log(&self) {
        self.state.lock().log.clear();
    }
}

impl Default for SimModule {
    fn default() -> Self {
        Self::new()
    }
}

/// One address window of a [`SimModule`].
pub struct SimSpace {
    module: SimModule,
    space: Space,
}

impl AddressSpace for SimSpace {
    fn read8(&mut self, offset: usize) -> u8 {
        let mut state = self.module.state.lock();
        let value = state.load(self.space, offset) as u8;
        state.record(self.space, AccessKind::Read, offset, 1, value as u16);
        value
    }

    fn read16(&mut self, offset: usize) -> u16 {
        let mut state = self.module.state.lock();
        let value = state.load(self.space, offset);
        state.record(self.space, AccessKind::Read, offset, 2, value);
        value
    }

    fn write8(&mut self, offset: usize, value: u8) {
        let mut state = self.module.state.lock();
        state.record(self.space, AccessKind::Write, offset, 1, value as u16);
        state.store(self.space, offset, value as u16);
    }

    fn write16(&mut self, offset: usize, value: u16) {
        let mut state = self.module.state.lock();
        state.record(self.space, AccessKind::Write, offset, 2, value);
        state.store(self.space, offset, value);
    }

    fn pop16(&mut self, offset: usize) -> u16 {
        let mut state = self.module.state.lock();
        let value = state.pop(self.space, offset);
        state.record(self.space, AccessKind::Pop, offset, 2, value);
        value
    }
}
