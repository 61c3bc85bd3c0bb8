//! Register maps.

pub mod ipucd;
