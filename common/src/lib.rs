//! Shared low-level primitives for the driver workspace.
//!
//! - [`sync`]: interrupt-aware locking used to serialize device access
//! - [`arch`]: architecture implementations of [`sync::irq::IrqControl`]

#![no_std]

#[cfg(test)]
extern crate std;

pub mod arch;
pub mod sync;
