//! Hardware Abstraction Layer (HAL) - Bus Access Traits
//!
//! This module defines how drivers reach device registers without knowing
//! how the bus is mapped. Drivers are written against [`AddressSpace`];
//! the platform (or a simulator) supplies the implementation.
//!
//! # Available Interfaces
//!
//! - [`address_space`]: width-aware access to one mapped bus window
//! - [`register`]: typed, offset-bound register descriptors

pub mod address_space;
pub mod register;

pub use address_space::{AddressSpace, MmioSpace};
pub use register::{
    Confirmed, Destructive, ReadOnly, Readable, Register, RegisterArray, Space, Span, Width,
    WordPair, Writable, spans_disjoint,
};
