//! Services the host kernel provides to the idle subsystem.

use core::fmt;

use idlewatch_abi::addr::PhysAddr;
use idlewatch_lib::cpu::{self, IrqFlags};
use idlewatch_lib::mmio::{MmioProt, MmioRegion};

/// Logical CPU number as the host scheduler names it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct CpuId(pub u32);

impl fmt::Display for CpuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-CPU instruction primitives.
///
/// Every method acts on the CPU executing it.
pub trait CpuOps: Sync {
    /// Save the interrupt state and disable interrupts.
    fn save_and_disable(&self) -> IrqFlags;

    /// Put the interrupt flag back exactly as `flags` recorded it.
    fn restore(&self, flags: IrqFlags);

    /// `sti; hlt`. Returns with interrupts enabled.
    fn enable_and_halt(&self);

    /// `sti; hlt; cli`. Returns with interrupts disabled, after the waking
    /// interrupt has been serviced.
    fn halt_and_disable(&self);
}

/// Kernel services consumed by the idle subsystem.
pub trait IdlePlatform: Sync {
    /// Map `size` bytes of device memory at `phys`. `None` if the device is
    /// absent or address space is exhausted.
    fn map_mmio(&self, phys: PhysAddr, size: usize, prot: MmioProt) -> Option<MmioRegion>;

    /// Release a mapping obtained from [`IdlePlatform::map_mmio`].
    fn unmap_mmio(&self, region: MmioRegion);

    /// Number of CPUs the scheduler dispatches to.
    fn cpu_count(&self) -> u32;

    fn is_current_cpu(&self, cpu: CpuId) -> bool;

    /// Deliver the scheduler's directed poke interrupt to `cpu`.
    fn poke_cpu(&self, cpu: CpuId);

    /// Whether `cpu`'s dispatch queue holds runnable work.
    fn has_runnable_work(&self, cpu: CpuId) -> bool;
}

/// [`CpuOps`] for the executing x86_64 processor.
#[derive(Clone, Copy, Debug, Default)]
pub struct X86Cpu;

impl CpuOps for X86Cpu {
    #[inline]
    fn save_and_disable(&self) -> IrqFlags {
        cpu::save_flags_cli()
    }

    #[inline]
    fn restore(&self, flags: IrqFlags) {
        cpu::restore_flags(flags);
    }

    #[inline]
    fn enable_and_halt(&self) {
        cpu::enable_and_hlt();
    }

    #[inline]
    fn halt_and_disable(&self) {
        cpu::enable_hlt_disable();
    }
}
