//! Halt primitives.
//!
//! `sti` delays interrupt recognition by one instruction, so an interrupt
//! that became pending while IF was clear is taken after the `hlt` begins
//! and wakes it. Splitting `sti` and `hlt` into separate asm blocks would
//! lose that guarantee.

use core::arch::asm;

/// Enable interrupts and halt until the next one arrives.
///
/// Returns with interrupts enabled.
#[inline(always)]
pub fn enable_and_hlt() {
    unsafe {
        asm!("sti", "hlt", options(nomem, nostack));
    }
}

/// Enable interrupts, halt, then disable interrupts again once woken.
///
/// The interrupt that ended the halt has been serviced by the time this
/// returns.
#[inline(always)]
pub fn enable_hlt_disable() {
    unsafe {
        asm!("sti", "hlt", "cli", options(nomem, nostack));
    }
}
