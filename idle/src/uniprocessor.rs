//! Halt path for CPUs with no peers to coordinate with.
//!
//! No timer is involved: on a uniprocessor the clock tick or any device
//! interrupt ends the halt, and there is nobody who could queue work for
//! this CPU without raising an interrupt on it.

use crate::hook::HaltStrategy;
use crate::irq::IrqSaveGuard;
use crate::platform::CpuOps;

/// Save interrupt state, halt once with interrupts enabled, restore.
#[derive(Debug, Default)]
pub struct UniprocessorHalt<C: CpuOps> {
    cpu: C,
}

impl<C: CpuOps> UniprocessorHalt<C> {
    pub const fn new(cpu: C) -> Self {
        Self { cpu }
    }

    #[inline]
    pub fn cpu(&self) -> &C {
        &self.cpu
    }
}

impl<C: CpuOps> HaltStrategy for UniprocessorHalt<C> {
    fn halt(&self) {
        let _irq = IrqSaveGuard::new(&self.cpu);
        self.cpu.enable_and_halt();
    }

    fn name(&self) -> &'static str {
        "uniprocessor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Bench, CpuEvent};

    #[test]
    fn halts_once_and_restores_disabled_state() {
        let bench = Bench::new(1);
        let up = UniprocessorHalt::new(bench.cpu());
        bench.set_interrupts_enabled(false);

        up.halt();

        assert_eq!(bench.halts(), 1);
        assert!(!bench.interrupts_enabled());
        assert_eq!(
            bench.cpu_events(),
            [
                CpuEvent::SaveDisable,
                CpuEvent::EnableHalt,
                CpuEvent::Restore { enabled: false },
            ]
        );
    }

    #[test]
    fn halts_once_and_restores_enabled_state() {
        let bench = Bench::new(1);
        let up = UniprocessorHalt::new(bench.cpu());
        up.halt();
        assert_eq!(bench.halts(), 1);
        assert!(bench.interrupts_enabled());
    }
}
