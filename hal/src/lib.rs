//! # Prism Hardware Access Layer
//!
//! Low-level primitives shared by the Prism power-management subsystems:
//!
//! - **MMIO regions**: bounds-checked volatile access to memory-mapped
//!   register banks
//! - **Bit fields**: mask/shift helpers for packed register fields
//!
//! This crate is deliberately policy-free. It knows nothing about power
//! domains, clock domains, or any particular chip; it only knows how to
//! touch registers safely. Higher layers (`prism-powerdomain`) build their
//! hardware-ops capabilities on top of these primitives.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod bits;
pub mod mmio;

pub use bits::BitField;
pub use mmio::{AccessError, MmioRegion};
