//! Hardware definitions shared by the idle subsystem crates.
//!
//! Nothing here has behaviour beyond bit manipulation: address newtypes,
//! Local APIC register layout and the interrupt vector assignments the idle
//! watchdog must coexist with.

#![no_std]
#![forbid(unsafe_code)]

pub mod addr;
pub mod arch;

pub use addr::*;
