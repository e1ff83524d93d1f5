//! LAPIC timer mode tracking and one-shot watchdog programming.
//!
//! The boot CPU may already run its LAPIC timer periodic as the clock tick.
//! Its initial count is the best available estimate of a normal tick, so the
//! first time a periodic timer is seen its count is cached and reused as the
//! watchdog interval. The capture only ever reads: reprogramming a periodic
//! timer would destroy the clock owner's schedule.

use core::sync::atomic::{AtomicU32, Ordering};

use idlewatch_abi::arch::x86_64::apic::{LvtTimer, TimerModeBits};
use idlewatch_lib::klog_debug;

use crate::window::ApicWindow;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerMode {
    OneShot,
    Periodic,
    TscDeadline,
}

impl TimerMode {
    pub const fn from_lvt(lvt: LvtTimer) -> Self {
        match lvt.mode() {
            TimerModeBits::Periodic => Self::Periodic,
            TimerModeBits::TscDeadline => Self::TscDeadline,
            // 11 is reserved; arming rewrites the whole entry as one-shot.
            TimerModeBits::OneShot | TimerModeBits::Reserved => Self::OneShot,
        }
    }
}

/// Cached periodic interval, shared by every CPU.
///
/// Zero means nothing cached: a zero count never describes a running timer.
#[derive(Debug)]
pub struct WatchdogInterval {
    count: AtomicU32,
}

impl WatchdogInterval {
    pub const fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
        }
    }

    #[inline]
    pub fn get(&self) -> Option<u32> {
        match self.count.load(Ordering::Acquire) {
            0 => None,
            count => Some(count),
        }
    }

    /// Cache `count` unless something is already cached.
    ///
    /// Returns `true` if this call stored it.
    pub fn capture(&self, count: u32) -> bool {
        if count == 0 {
            return false;
        }
        self.count
            .compare_exchange(0, count, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// The cached interval, or `default` if none has been seen.
    #[inline]
    pub fn or_default(&self, default: u32) -> u32 {
        self.get().unwrap_or(default)
    }
}

impl Default for WatchdogInterval {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
pub fn current_mode(window: &ApicWindow) -> TimerMode {
    TimerMode::from_lvt(window.lvt_timer())
}

/// Cache the running periodic timer's count as the watchdog interval.
///
/// Only reads the window. Returns the count if this call cached it.
pub fn observe_and_cache_interval(
    window: &ApicWindow,
    interval: &WatchdogInterval,
) -> Option<u32> {
    let count = window.initial_count();
    if interval.capture(count) {
        klog_debug!("IDLE: Watchdog interval {} taken from periodic LAPIC timer", count);
        Some(count)
    } else {
        None
    }
}

/// Program a one-shot, unmasked timer that fires `vector` after `count`.
pub fn arm_one_shot(window: &ApicWindow, count: u32, vector: u8) {
    window.set_initial_count(count);
    window.set_lvt_timer(LvtTimer::one_shot(vector));
}

/// Stop and mask the one-shot timer, keeping its vector.
pub fn disarm_one_shot(window: &ApicWindow) {
    window.set_initial_count(0);
    window.set_lvt_timer(window.lvt_timer().masked());
}
