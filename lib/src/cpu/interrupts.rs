//! Interrupt flag management: cli, irqsave/irqrestore.

use core::arch::asm;

use x86_64::registers::rflags::RFlags;

/// RFLAGS snapshot taken by [`save_flags_cli`].
///
/// Only the interrupt flag is acted upon when restoring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct IrqFlags(u64);

impl IrqFlags {
    #[inline]
    pub const fn from_bits(raw: u64) -> Self {
        Self(raw)
    }

    /// Flags describing a context with interrupts enabled.
    #[inline]
    pub const fn enabled() -> Self {
        Self(RFlags::INTERRUPT_FLAG.bits())
    }

    /// Flags describing a context with interrupts disabled.
    #[inline]
    pub const fn disabled() -> Self {
        Self(0)
    }

    #[inline]
    pub const fn bits(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn interrupts_enabled(self) -> bool {
        self.0 & RFlags::INTERRUPT_FLAG.bits() != 0
    }
}

/// Disable interrupts (CLI).
#[inline(always)]
pub fn disable_interrupts() {
    unsafe {
        asm!("cli", options(nomem, nostack));
    }
}

/// Save RFLAGS and disable interrupts (irqsave pattern).
#[inline(always)]
pub fn save_flags_cli() -> IrqFlags {
    let flags: u64;
    unsafe {
        asm!(
            "pushfq",
            "pop {}",
            "cli",
            out(reg) flags,
            options(nomem)
        );
    }
    IrqFlags::from_bits(flags)
}

/// Restore the interrupt flag from a saved snapshot (irqrestore pattern).
///
/// Unlike a bare `sti`-if-set, this also clears IF when the snapshot had it
/// clear, so the caller ends in exactly the state it was saved in even if
/// something in between enabled interrupts.
#[inline(always)]
pub fn restore_flags(flags: IrqFlags) {
    if flags.interrupts_enabled() {
        unsafe {
            asm!("sti", options(nomem, nostack));
        }
    } else {
        disable_interrupts();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn irq_flags_track_interrupt_bit_only() {
        assert!(IrqFlags::enabled().interrupts_enabled());
        assert!(!IrqFlags::disabled().interrupts_enabled());
        // IF is bit 9; the always-one bit 1 alone does not count.
        assert!(!IrqFlags::from_bits(0x2).interrupts_enabled());
        assert!(IrqFlags::from_bits(0x202).interrupts_enabled());
    }
}
