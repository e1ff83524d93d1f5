//! Local APIC register layout used by the idle watchdog.
//!
//! Only the slice of the register block the idle path touches is described
//! here: the LVT timer entry, the timer initial count, the interrupt command
//! register and the local ID.

// =============================================================================
// Register Block
// =============================================================================

/// Architectural default physical base of the Local APIC register block.
pub const LAPIC_DEFAULT_PHYS_BASE: u64 = 0xFEE0_0000;

/// Span of the register block mapped by the idle subsystem.
///
/// Covers every register up to and including the timer initial count.
pub const LAPIC_IDLE_WINDOW_SIZE: usize = 0x3F0;

// =============================================================================
// Register Offsets
// =============================================================================

/// Local APIC ID register offset.
pub const LAPIC_ID: u32 = 0x020;

/// Interrupt Command Register (low 32-bits) offset.
pub const LAPIC_ICR_LOW: u32 = 0x300;

/// Local Vector Table: Timer offset.
pub const LAPIC_LVT_TIMER: u32 = 0x320;

/// Timer Initial Count Register offset.
pub const LAPIC_TIMER_ICR: u32 = 0x380;

// =============================================================================
// LVT Timer Fields
// =============================================================================

/// Vector field of an LVT entry (bits 0-7).
pub const LAPIC_LVT_VECTOR_MASK: u32 = 0xFF;

/// Mask flag for LVT entries (bit 16).
pub const LAPIC_LVT_MASKED: u32 = 1 << 16;

/// Shift of the two-bit timer mode field (bits 17-18).
pub const LAPIC_TIMER_MODE_SHIFT: u32 = 17;

/// Width mask of the timer mode field once shifted down.
pub const LAPIC_TIMER_MODE_MASK: u32 = 0b11;

/// Raw encodings of the timer mode field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum TimerModeBits {
    OneShot = 0b00,
    Periodic = 0b01,
    TscDeadline = 0b10,
    Reserved = 0b11,
}

impl TimerModeBits {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        match raw & LAPIC_TIMER_MODE_MASK {
            0b00 => Self::OneShot,
            0b01 => Self::Periodic,
            0b10 => Self::TscDeadline,
            _ => Self::Reserved,
        }
    }
}

/// Value of the LVT timer register.
///
/// Layout:
/// - Bits 0-7: Interrupt vector
/// - Bit 12: Delivery status (read-only)
/// - Bit 16: Mask
/// - Bits 17-18: Timer mode (00 one-shot, 01 periodic, 10 TSC-deadline)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct LvtTimer(pub u32);

impl LvtTimer {
    /// A one-shot, unmasked entry delivering `vector`.
    #[inline]
    pub const fn one_shot(vector: u8) -> Self {
        Self(vector as u32)
    }

    #[inline]
    pub const fn vector(self) -> u8 {
        (self.0 & LAPIC_LVT_VECTOR_MASK) as u8
    }

    #[inline]
    pub const fn is_masked(self) -> bool {
        self.0 & LAPIC_LVT_MASKED != 0
    }

    #[inline]
    pub const fn mode(self) -> TimerModeBits {
        TimerModeBits::from_raw(self.0 >> LAPIC_TIMER_MODE_SHIFT)
    }

    /// Same entry with the mask bit set; vector and mode are preserved.
    #[inline]
    pub const fn masked(self) -> Self {
        Self(self.0 | LAPIC_LVT_MASKED)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }
}
