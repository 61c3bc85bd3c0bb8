use crate::sync::irq::IrqControl;

/// IRQ mask bit in the CPSR.
const CPSR_I_BIT: u32 = 1 << 7;

/// CPSR-based interrupt masking for 32-bit ARM cores.
///
/// `State` records whether IRQs were enabled before `disable()`, so nested
/// critical sections only re-enable interrupts at the outermost level.
pub struct ArmIrq;

impl IrqControl for ArmIrq {
    type State = bool;

    #[inline(always)]
    fn disable() -> bool {
        let cpsr: u32;
        // SAFETY: reads CPSR and sets the I bit; no memory is touched.
        unsafe {
            core::arch::asm!(
                "mrs {0}, cpsr",
                "cpsid i",
                out(reg) cpsr,
                options(nomem, nostack)
            );
        }
        cpsr & CPSR_I_BIT == 0
    }

    #[inline(always)]
    fn restore(was_enabled: bool) {
        if was_enabled {
            // SAFETY: only clears the I bit that `disable()` set.
            unsafe {
                core::arch::asm!("cpsie i", options(nomem, nostack));
            }
        }
    }
}
