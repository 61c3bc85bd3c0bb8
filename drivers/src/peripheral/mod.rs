//! Peripheral Drivers
//!
//! # Available Peripherals
//!
//! - [`ipucd`]: IP-UCD TCLK/MDAT timing module

pub mod ipucd;
