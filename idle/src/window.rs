//! Typed view of the Local APIC register block.
//!
//! Offsets are fixed at compile time; the only runtime check is the one in
//! [`ApicWindow::acquire`] that the mapping the platform returned actually
//! reaches the timer registers.

use idlewatch_abi::addr::PhysAddr;
use idlewatch_abi::arch::x86_64::apic::{LAPIC_ID, LAPIC_LVT_TIMER, LAPIC_TIMER_ICR, LvtTimer};
use idlewatch_lib::mmio::{MmioProt, MmioRegion};
use idlewatch_lib::{klog_debug, klog_info};

use crate::platform::IdlePlatform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApicWindow {
    region: MmioRegion,
}

impl ApicWindow {
    /// Map the register block read/write.
    ///
    /// Returns `None` when the platform cannot map it or hands back a
    /// mapping too short to hold the timer registers; the short mapping is
    /// released again.
    pub fn acquire<P: IdlePlatform + ?Sized>(
        platform: &P,
        base: PhysAddr,
        size: usize,
    ) -> Option<Self> {
        let Some(region) = platform.map_mmio(base, size, MmioProt::READ_WRITE) else {
            klog_info!(
                "IDLE: Cannot map LAPIC at 0x{:x}, idling without watchdog",
                base
            );
            return None;
        };

        if !region.is_valid_offset(LAPIC_TIMER_ICR as usize, 4) {
            klog_info!(
                "IDLE: LAPIC mapping of {} bytes too short, idling without watchdog",
                region.size()
            );
            platform.unmap_mmio(region);
            return None;
        }

        let window = Self { region };
        klog_debug!(
            "IDLE: LAPIC phys 0x{:x} mapped at 0x{:x}, LVT timer 0x{:x}",
            base,
            region.virt_base(),
            window.lvt_timer().bits()
        );
        Some(window)
    }

    /// Unmap the register block.
    pub fn release<P: IdlePlatform + ?Sized>(self, platform: &P) {
        klog_debug!("IDLE: Unmapping LAPIC at 0x{:x}", self.region.virt_base());
        platform.unmap_mmio(self.region);
    }

    #[inline]
    pub fn lvt_timer(&self) -> LvtTimer {
        LvtTimer(self.region.read_u32(LAPIC_LVT_TIMER as usize))
    }

    #[inline]
    pub fn set_lvt_timer(&self, lvt: LvtTimer) {
        self.region.write_u32(LAPIC_LVT_TIMER as usize, lvt.bits());
    }

    #[inline]
    pub fn initial_count(&self) -> u32 {
        self.region.read_u32(LAPIC_TIMER_ICR as usize)
    }

    #[inline]
    pub fn set_initial_count(&self, count: u32) {
        self.region.write_u32(LAPIC_TIMER_ICR as usize, count);
    }

    /// APIC ID of the CPU performing the read.
    #[inline]
    pub fn local_id(&self) -> u32 {
        self.region.read_u32(LAPIC_ID as usize) >> 24
    }
}
