//! Directed wakeup of a halted CPU.

use idlewatch_lib::klog_trace;

use crate::platform::{CpuId, IdlePlatform};

/// Poke `target` out of `hlt`.
///
/// A CPU issuing this call is running, not halted, so poking itself is
/// skipped. Poking a CPU that is not halted is harmless: the interrupt is
/// dispatched as spurious. Returns whether an interrupt was sent.
pub fn wake<P: IdlePlatform + ?Sized>(platform: &P, target: CpuId) -> bool {
    if platform.is_current_cpu(target) {
        return false;
    }
    klog_trace!("IDLE: Poking CPU {}", target);
    platform.poke_cpu(target);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Bench;
    use std::vec;

    #[test]
    fn self_wake_is_a_no_op() {
        let bench = Bench::new(4);
        bench.set_current_cpu(CpuId(2));
        assert!(!wake(&bench.platform(), CpuId(2)));
        assert!(bench.pokes().is_empty());
    }

    #[test]
    fn other_cpu_gets_one_poke_per_call() {
        let bench = Bench::new(4);
        bench.set_current_cpu(CpuId(0));
        let platform = bench.platform();
        assert!(wake(&platform, CpuId(3)));
        assert!(wake(&platform, CpuId(3)));
        assert_eq!(bench.pokes(), vec![CpuId(3), CpuId(3)]);
    }
}
