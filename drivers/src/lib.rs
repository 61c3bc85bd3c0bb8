//! IP-UCD Driver Crate
//!
//! Layered the same way as the rest of the driver tree:
//!
//! # Module Organization
//!
//! - [`hal`]: bus access traits and typed register descriptors
//! - [`hw`]: bit-exact register maps
//! - [`peripheral`]: device drivers built on the two layers above
//!
//! # Usage Example
//!
//! ```no_run
//! use ipucd::peripheral::ipucd::{IpUcd, UcdConfig};
//!
//! let cfg = UcdConfig::new(0xffff_6000, 0x2000_0000).fifo_threshold(32);
//! let ucd: IpUcd<_, _> = unsafe { IpUcd::map(&cfg)? };
//! let status = ucd.status();
//! # let _ = status;
//! # Ok::<(), ipucd::peripheral::ipucd::UcdError>(())
//! ```

#![no_std]

#[cfg(test)]
extern crate std;

#[cfg(feature = "sim")]
extern crate alloc;

pub mod hal;
pub mod hw;
pub mod peripheral;

// Re-export commonly used types
pub use hal::address_space::{AddressSpace, MmioSpace};
pub use hw::ipucd::{ControlCommand, Status};
pub use peripheral::ipucd::{FifoEntry, IpUcd, UcdConfig, UcdError};
