//! Idle subsystem configuration.

use idlewatch_abi::addr::PhysAddr;
use idlewatch_abi::arch::x86_64::apic::{
    LAPIC_DEFAULT_PHYS_BASE, LAPIC_ID, LAPIC_ICR_LOW, LAPIC_IDLE_WINDOW_SIZE, LAPIC_LVT_TIMER,
    LAPIC_TIMER_ICR,
};
use idlewatch_abi::arch::x86_64::vectors::{
    CLOCK_TICK_VECTOR, EXCEPTION_VECTOR_LIMIT, IDLE_WAKEUP_VECTOR, POKE_IPI_VECTOR,
};

use crate::error::{IdleError, IdleResult};

/// Watchdog count used until a periodic LAPIC timer has been observed.
pub const DEFAULT_WATCHDOG_INTERVAL: u32 = 0x04C4_2E50;

/// Vectors the wakeup vector may never share.
pub const DEFAULT_RESERVED_VECTORS: &[u8] = &[CLOCK_TICK_VECTOR, POKE_IPI_VECTOR];

/// Smallest window that covers every register the idle path touches.
const MIN_WINDOW_SIZE: usize = {
    let mut end = 0u32;
    let regs = [LAPIC_ID, LAPIC_ICR_LOW, LAPIC_LVT_TIMER, LAPIC_TIMER_ICR];
    let mut i = 0;
    while i < regs.len() {
        if regs[i] + 4 > end {
            end = regs[i] + 4;
        }
        i += 1;
    }
    end as usize
};

const _: () = assert!(MIN_WINDOW_SIZE <= LAPIC_IDLE_WINDOW_SIZE);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdleConfig {
    /// Vector the one-shot watchdog delivers.
    pub wakeup_vector: u8,
    /// Fallback watchdog count when no periodic timer was ever seen.
    pub default_interval: u32,
    /// Vectors owned by the clock and the scheduler's pokes.
    pub reserved_vectors: &'static [u8],
    pub apic_base: PhysAddr,
    pub apic_size: usize,
}

impl IdleConfig {
    pub const fn new() -> Self {
        Self {
            wakeup_vector: IDLE_WAKEUP_VECTOR,
            default_interval: DEFAULT_WATCHDOG_INTERVAL,
            reserved_vectors: DEFAULT_RESERVED_VECTORS,
            apic_base: PhysAddr(LAPIC_DEFAULT_PHYS_BASE),
            apic_size: LAPIC_IDLE_WINDOW_SIZE,
        }
    }

    pub const fn with_wakeup_vector(mut self, vector: u8) -> Self {
        self.wakeup_vector = vector;
        self
    }

    pub const fn with_default_interval(mut self, count: u32) -> Self {
        self.default_interval = count;
        self
    }

    pub const fn with_reserved_vectors(mut self, vectors: &'static [u8]) -> Self {
        self.reserved_vectors = vectors;
        self
    }

    pub const fn with_apic_window(mut self, base: PhysAddr, size: usize) -> Self {
        self.apic_base = base;
        self.apic_size = size;
        self
    }

    /// Check the configuration before anything is swapped or mapped.
    pub fn validate(&self) -> IdleResult {
        let vector = self.wakeup_vector;
        if vector < EXCEPTION_VECTOR_LIMIT {
            return Err(IdleError::InvalidVector { vector });
        }
        if self.reserved_vectors.contains(&vector) {
            return Err(IdleError::VectorConflict { vector });
        }
        if self.default_interval == 0 {
            return Err(IdleError::ZeroInterval);
        }
        if self.apic_size < MIN_WINDOW_SIZE {
            return Err(IdleError::WindowTooSmall {
                size: self.apic_size,
            });
        }
        Ok(())
    }
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self::new()
    }
}
