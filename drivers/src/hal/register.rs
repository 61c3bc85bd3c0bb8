//! Typed register descriptors.
//!
//! A descriptor binds a register name to a fixed location: which address
//! space it lives in, its byte offset, its width, and what kind of access it
//! allows. Access rights are marker types, so writing a read-only register
//! or popping a plain one is a compile error rather than a runtime check.
//!
//! Every descriptor has a `const` [`Span`]. A device's register map can list
//! its spans and assert [`spans_disjoint`] in a `const` item, which rejects
//! overlapping layouts at build time.
//!
//! ```ignore
//! const CONTROL: Register<u16, Confirmed> = Register::new(Space::A16, 0x40);
//! const _: () = assert!(spans_disjoint(&[CONTROL.span(), STATUS.span()]));
//! ```

use core::marker::PhantomData;

use super::address_space::AddressSpace;

/// Bus address space a register is decoded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    /// Short I/O space: control and status.
    A16,
    /// Extended space: bulk memory such as lookup tables and FIFOs.
    A32,
}

/// Byte range occupied by a register within its address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub space: Space,
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn overlaps(&self, other: &Span) -> bool {
        self.space as u8 == other.space as u8 && self.start < other.end && other.start < self.end
    }

    /// Whether the span lies inside a window of `size` bytes.
    pub const fn fits(&self, size: usize) -> bool {
        self.end <= size
    }
}

/// Returns `true` if no two spans in `spans` overlap.
pub const fn spans_disjoint(spans: &[Span]) -> bool {
    let mut i = 0;
    while i < spans.len() {
        let mut j = i + 1;
        while j < spans.len() {
            if spans[i].overlaps(&spans[j]) {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

/// Register data width.
pub trait Width: Copy + 'static {
    const BYTES: usize;

    fn load<S: AddressSpace + ?Sized>(space: &mut S, offset: usize) -> Self;

    fn store<S: AddressSpace + ?Sized>(space: &mut S, offset: usize, value: Self);

    fn pop<S: AddressSpace + ?Sized>(space: &mut S, offset: usize) -> Self;
}

impl Width for u8 {
    const BYTES: usize = 1;

    fn load<S: AddressSpace + ?Sized>(space: &mut S, offset: usize) -> Self {
        space.read8(offset)
    }

    fn store<S: AddressSpace + ?Sized>(space: &mut S, offset: usize, value: Self) {
        space.write8(offset, value)
    }

    // No 8-bit destructive registers exist on supported hardware.
    fn pop<S: AddressSpace + ?Sized>(space: &mut S, offset: usize) -> Self {
        space.read8(offset)
    }
}

impl Width for u16 {
    const BYTES: usize = 2;

    fn load<S: AddressSpace + ?Sized>(space: &mut S, offset: usize) -> Self {
        space.read16(offset)
    }

    fn store<S: AddressSpace + ?Sized>(space: &mut S, offset: usize, value: Self) {
        space.write16(offset, value)
    }

    fn pop<S: AddressSpace + ?Sized>(space: &mut S, offset: usize) -> Self {
        space.pop16(offset)
    }
}

/// Access modes that permit reads.
pub trait Readable {
    /// Reading removes the value from the device.
    const DESTRUCTIVE: bool;
}

/// Access modes that permit writes.
///
/// Every write is followed by a discarded read-back so a posted bus write has
/// reached the device before the next access.
pub trait Writable {}

/// Read-only register (PROM, identification).
#[derive(Debug)]
pub struct ReadOnly;

/// Read/write register whose writes are confirmed by a read-back.
#[derive(Debug)]
pub struct Confirmed;

/// Read-only register whose reads consume data.
#[derive(Debug)]
pub struct Destructive;

impl Readable for ReadOnly {
    const DESTRUCTIVE: bool = false;
}

impl Readable for Confirmed {
    const DESTRUCTIVE: bool = false;
}

impl Writable for Confirmed {}

impl Readable for Destructive {
    const DESTRUCTIVE: bool = true;
}

#[inline]
fn read_as<W: Width, A: Readable, S: AddressSpace + ?Sized>(space: &mut S, offset: usize) -> W {
    if A::DESTRUCTIVE {
        W::pop(space, offset)
    } else {
        W::load(space, offset)
    }
}

#[inline]
fn write_as<W: Width, A: Writable, S: AddressSpace + ?Sized>(
    space: &mut S,
    offset: usize,
    value: W,
) {
    W::store(space, offset, value);
    let _ = W::load(space, offset);
}

/// A single register of width `W` with access mode `A`.
pub struct Register<W, A> {
    space: Space,
    offset: usize,
    _marker: PhantomData<(W, A)>,
}

impl<W: Width, A> Register<W, A> {
    pub const fn new(space: Space, offset: usize) -> Self {
        Self {
            space,
            offset,
            _marker: PhantomData,
        }
    }

    pub const fn space(&self) -> Space {
        self.space
    }

    pub const fn offset(&self) -> usize {
        self.offset
    }

    pub const fn span(&self) -> Span {
        Span {
            space: self.space,
            start: self.offset,
            end: self.offset + W::BYTES,
        }
    }
}

impl<W: Width, A: Readable> Register<W, A> {
    pub fn read<S: AddressSpace + ?Sized>(&self, space: &mut S) -> W {
        read_as::<W, A, S>(space, self.offset)
    }
}

impl<W: Width, A: Writable> Register<W, A> {
    pub fn write<S: AddressSpace + ?Sized>(&self, space: &mut S, value: W) {
        write_as::<W, A, S>(space, self.offset, value)
    }
}

/// `N` consecutive registers of width `W`.
pub struct RegisterArray<W, A, const N: usize> {
    space: Space,
    offset: usize,
    _marker: PhantomData<(W, A)>,
}

impl<W: Width, A, const N: usize> RegisterArray<W, A, N> {
    pub const fn new(space: Space, offset: usize) -> Self {
        Self {
            space,
            offset,
            _marker: PhantomData,
        }
    }

    pub const fn space(&self) -> Space {
        self.space
    }

    pub const fn span(&self) -> Span {
        Span {
            space: self.space,
            start: self.offset,
            end: self.offset + N * W::BYTES,
        }
    }

    /// Byte offset of element `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= N`.
    pub const fn element_offset(&self, index: usize) -> usize {
        assert!(index < N, "register array index out of range");
        self.offset + index * W::BYTES
    }
}

impl<W: Width, A: Readable, const N: usize> RegisterArray<W, A, N> {
    pub fn read_element<S: AddressSpace + ?Sized>(&self, space: &mut S, index: usize) -> W {
        read_as::<W, A, S>(space, self.element_offset(index))
    }
}

impl<W: Width, A: Writable, const N: usize> RegisterArray<W, A, N> {
    pub fn write_element<S: AddressSpace + ?Sized>(&self, space: &mut S, index: usize, value: W) {
        write_as::<W, A, S>(space, self.element_offset(index), value)
    }
}

/// A 32-bit logical value stored as two 16-bit hardware words.
///
/// The high word is always read first. The two reads are separate bus
/// cycles, so the pair is not atomic with respect to the device; callers
/// that need a coherent value rely on the device latching it (as FIFOs do).
pub struct WordPair<A> {
    space: Space,
    high: usize,
    low: usize,
    _marker: PhantomData<A>,
}

impl<A> WordPair<A> {
    /// High word at `offset`, low word in the next 16-bit slot.
    pub const fn adjacent(space: Space, offset: usize) -> Self {
        Self::split(space, offset, offset + 2)
    }

    /// Words at arbitrary offsets.
    pub const fn split(space: Space, high: usize, low: usize) -> Self {
        Self {
            space,
            high,
            low,
            _marker: PhantomData,
        }
    }

    pub const fn space(&self) -> Space {
        self.space
    }

    pub const fn span(&self) -> Span {
        let (first, last) = if self.high < self.low {
            (self.high, self.low)
        } else {
            (self.low, self.high)
        };
        Span {
            space: self.space,
            start: first,
            end: last + 2,
        }
    }
}

impl<A: Readable> WordPair<A> {
    pub fn read<S: AddressSpace + ?Sized>(&self, space: &mut S) -> u32 {
        let high = read_as::<u16, A, S>(space, self.high) as u32;
        let low = read_as::<u16, A, S>(space, self.low) as u32;
        (high << 16) | low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    /// Records every access as (op, offset).
    #[derive(Default)]
    struct Recorder {
        ops: Vec<(&'static str, usize)>,
        next: u16,
    }

    impl AddressSpace for Recorder {
        fn read8(&mut self, offset: usize) -> u8 {
            self.ops.push(("r8", offset));
            self.next as u8
        }

        fn read16(&mut self, offset: usize) -> u16 {
            self.ops.push(("r16", offset));
            self.next
        }

        fn write8(&mut self, offset: usize, _value: u8) {
            self.ops.push(("w8", offset));
        }

        fn write16(&mut self, offset: usize, _value: u16) {
            self.ops.push(("w16", offset));
        }

        fn pop16(&mut self, offset: usize) -> u16 {
            self.ops.push(("pop16", offset));
            let value = self.next;
            self.next = self.next.wrapping_add(1);
            value
        }
    }

    #[test]
    fn test_confirmed_write_reads_back() {
        let reg: Register<u16, Confirmed> = Register::new(Space::A16, 0x40);
        let mut bus = Recorder::default();
        reg.write(&mut bus, 5);
        assert_eq!(bus.ops, [("w16", 0x40), ("r16", 0x40)]);
    }

    #[test]
    fn test_array_element_offsets() {
        let table: RegisterArray<u16, Confirmed, 256> = RegisterArray::new(Space::A32, 0x0);
        assert_eq!(table.element_offset(0), 0);
        assert_eq!(table.element_offset(255), 510);
        assert_eq!(table.span().end, 512);

        let mut bus = Recorder::default();
        let _ = table.read_element(&mut bus, 3);
        assert_eq!(bus.ops, [("r16", 6)]);
    }

    #[test]
    #[should_panic]
    fn test_array_index_out_of_range() {
        let table: RegisterArray<u16, Confirmed, 4> = RegisterArray::new(Space::A32, 0x0);
        let _ = table.element_offset(4);
    }

    #[test]
    fn test_word_pair_high_first() {
        let pair: WordPair<Destructive> = WordPair::adjacent(Space::A32, 0x1200);
        let mut bus = Recorder {
            next: 0x1234,
            ..Default::default()
        };
        assert_eq!(pair.read(&mut bus), 0x1234_1235);
        assert_eq!(bus.ops, [("pop16", 0x1200), ("pop16", 0x1202)]);
    }

    #[test]
    fn test_split_pair_span() {
        let pair: WordPair<ReadOnly> = WordPair::split(Space::A16, 0x48, 0x46);
        assert_eq!(
            pair.span(),
            Span {
                space: Space::A16,
                start: 0x46,
                end: 0x4a
            }
        );
    }

    #[test]
    fn test_overlap_detection() {
        let a: Register<u16, ReadOnly> = Register::new(Space::A16, 0x40);
        let b: Register<u8, ReadOnly> = Register::new(Space::A16, 0x41);
        let c: Register<u8, ReadOnly> = Register::new(Space::A32, 0x41);
        let d: Register<u8, ReadOnly> = Register::new(Space::A16, 0x42);

        assert!(!spans_disjoint(&[a.span(), b.span()]));
        assert!(spans_disjoint(&[a.span(), c.span(), d.span()]));
        assert!(a.span().fits(0x42));
        assert!(!d.span().fits(0x42));
    }
}
