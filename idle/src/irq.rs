//! Scoped interrupt masking for the idle entry paths.

use core::marker::PhantomData;

use idlewatch_lib::cpu::IrqFlags;

use crate::platform::CpuOps;

/// RAII guard: interrupts off on creation, previous state back on drop.
///
/// Restoration happens on every exit path, including early returns.
/// !Send/!Sync: the saved flags belong to the CPU that took them.
#[must_use = "if unused, interrupts are restored immediately"]
pub struct IrqSaveGuard<'a, C: CpuOps + ?Sized> {
    cpu: &'a C,
    saved_flags: IrqFlags,
    _marker: PhantomData<*mut ()>,
}

impl<'a, C: CpuOps + ?Sized> IrqSaveGuard<'a, C> {
    #[inline]
    pub fn new(cpu: &'a C) -> Self {
        let saved_flags = cpu.save_and_disable();
        Self {
            cpu,
            saved_flags,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn saved_flags(&self) -> IrqFlags {
        self.saved_flags
    }
}

impl<C: CpuOps + ?Sized> Drop for IrqSaveGuard<'_, C> {
    #[inline]
    fn drop(&mut self) {
        self.cpu.restore(self.saved_flags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Bench, CpuEvent};

    #[test]
    fn restores_saved_state_on_drop() {
        let bench = Bench::new(2);
        let cpu = bench.cpu();
        {
            let guard = IrqSaveGuard::new(&cpu);
            assert!(guard.saved_flags().interrupts_enabled());
            assert!(!bench.interrupts_enabled());
        }
        assert!(bench.interrupts_enabled());
        assert_eq!(
            bench.cpu_events(),
            [CpuEvent::SaveDisable, CpuEvent::Restore { enabled: true }]
        );
    }

    #[test]
    fn nested_guard_keeps_outer_disabled() {
        let bench = Bench::new(2);
        let cpu = bench.cpu();
        let outer = IrqSaveGuard::new(&cpu);
        {
            let inner = IrqSaveGuard::new(&cpu);
            assert!(!inner.saved_flags().interrupts_enabled());
        }
        assert!(!bench.interrupts_enabled());
        drop(outer);
        assert!(bench.interrupts_enabled());
    }
}
