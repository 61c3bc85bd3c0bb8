//! Architecture-specific interrupt control.
//!
//! [`PlatformIrq`] names the [`IrqControl`](crate::sync::irq::IrqControl)
//! implementation for the current target. Hosted targets fall back to
//! [`NoIrq`](crate::sync::irq::NoIrq): there is no interrupt context to mask,
//! only threads. A bare-metal target without an implementation is a build
//! error, since a lock that fails to mask interrupts can deadlock against a
//! handler on the same core.

cfg_if::cfg_if! {
    if #[cfg(target_arch = "arm")] {
        pub mod arm;
        pub use arm::irq::ArmIrq as PlatformIrq;
    } else if #[cfg(target_os = "none")] {
        compile_error!("no IrqControl implementation for this bare-metal target");
    } else {
        pub use crate::sync::irq::NoIrq as PlatformIrq;
    }
}
