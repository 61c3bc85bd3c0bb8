use core::fmt::Debug;

/// Architecture-specific interrupt masking interface.
///
/// Implemented per architecture in [`crate::arch`]. Locks that may be taken
/// from interrupt context are parameterized over it.
pub trait IrqControl {
    /// Saved interrupt state
    type State: Copy + Debug;

    /// Disable interrupts and return the previous state.
    fn disable() -> Self::State;

    /// Restore interrupts to a previous state.
    fn restore(state: Self::State);
}

/// Interrupt control for environments without interrupt contexts.
///
/// Host builds, simulators and single-context firmware use this. With it an
/// [`IrqSpinLock`](super::IrqSpinLock) behaves like a plain spinlock.
#[derive(Debug, Clone, Copy)]
pub struct NoIrq;

impl IrqControl for NoIrq {
    type State = ();

    #[inline(always)]
    fn disable() {}

    #[inline(always)]
    fn restore(_state: ()) {}
}
