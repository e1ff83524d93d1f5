//! SMP idle loop with a LAPIC one-shot watchdog.
//!
//! Per idle entry, with interrupts disabled by the caller:
//!
//! 1. Arm: a non-periodic timer is programmed one-shot with the watchdog
//!    interval. A periodic timer is left running and its count cached.
//! 2. Halt with interrupts enabled; any interrupt resumes the CPU.
//! 3. Re-check the dispatch queue. Empty: back to 1.
//! 4. Disarm: a one-shot timer is masked with a zero count so it cannot
//!    fire into real work.
//!
//! Every halt therefore has either the clock tick or an armed one-shot
//! behind it, and no CPU sleeps longer than one interval without looking at
//! its queue.

use idlewatch_lib::klog_trace;

use crate::config::IdleConfig;
use crate::platform::{CpuId, CpuOps, IdlePlatform};
use crate::timer::{self, TimerMode, WatchdogInterval};
use crate::window::ApicWindow;

/// What one idle entry did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IdleCycle {
    /// Times the CPU halted.
    pub halts: u32,
    /// One-shot programs written.
    pub arms: u32,
    /// Whether the one-shot was masked on the way out.
    pub disarmed: bool,
    /// Whether some pass found the timer periodic.
    pub saw_periodic: bool,
}

pub struct Watchdog<'a, P: IdlePlatform + ?Sized, C: CpuOps + ?Sized> {
    pub platform: &'a P,
    pub cpu_ops: &'a C,
    pub window: &'a ApicWindow,
    pub interval: &'a WatchdogInterval,
    pub config: &'a IdleConfig,
}

impl<P: IdlePlatform + ?Sized, C: CpuOps + ?Sized> Watchdog<'_, P, C> {
    /// Halt until `cpu` has runnable work.
    ///
    /// Must be called with interrupts disabled; returns with them disabled.
    pub fn idle_until_work(&self, cpu: CpuId) -> IdleCycle {
        let mut cycle = IdleCycle::default();

        loop {
            self.arm(&mut cycle);

            self.cpu_ops.halt_and_disable();
            cycle.halts += 1;

            if self.platform.has_runnable_work(cpu) {
                break;
            }
            klog_trace!("IDLE: CPU {} woke to an empty queue", cpu);
        }

        if timer::current_mode(self.window) == TimerMode::OneShot {
            timer::disarm_one_shot(self.window);
            cycle.disarmed = true;
        }

        cycle
    }

    fn arm(&self, cycle: &mut IdleCycle) {
        if timer::current_mode(self.window) == TimerMode::Periodic {
            timer::observe_and_cache_interval(self.window, self.interval);
            cycle.saw_periodic = true;
            return;
        }

        let count = self.interval.or_default(self.config.default_interval);
        timer::arm_one_shot(self.window, count, self.config.wakeup_vector);
        cycle.arms += 1;
    }
}
