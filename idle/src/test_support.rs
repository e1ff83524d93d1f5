//! Fake machine for host tests: a heap-backed LAPIC register block, a
//! scripted dispatch queue, and CPU primitives that record instead of halt.

use core::ptr::{read_volatile, write_volatile};
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use std::boxed::Box;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use std::vec::Vec;

use idlewatch_abi::addr::{PhysAddr, VirtAddr};
use idlewatch_abi::arch::x86_64::apic::{LAPIC_LVT_TIMER, LAPIC_TIMER_ICR};
use idlewatch_lib::cpu::IrqFlags;
use idlewatch_lib::mmio::{MmioProt, MmioRegion};

use crate::platform::{CpuId, CpuOps, IdlePlatform};

const REG_BYTES: usize = 0x400;
const REG_WORDS: usize = REG_BYTES / 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CpuEvent {
    SaveDisable,
    Restore { enabled: bool },
    /// `sti; hlt`
    EnableHalt,
    /// `sti; hlt; cli`
    HaltDisable,
}

/// Timer registers as they stood when a halt began.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HaltSnapshot {
    pub lvt: u32,
    pub icr: u32,
}

type HaltHook = Box<dyn FnMut(&Bench) + Send>;

struct Machine {
    regs: *mut u32,
    cpu_count: u32,
    current_cpu: AtomicU32,
    map_fails: AtomicBool,
    slow_map: AtomicBool,
    map_calls: AtomicUsize,
    unmap_calls: AtomicUsize,
    last_map: Mutex<Option<(PhysAddr, usize, MmioProt)>>,
    pokes: Mutex<Vec<CpuId>>,
    work_at_halt: AtomicU32,
    halts: AtomicU32,
    irq_enabled: AtomicBool,
    events: Mutex<Vec<CpuEvent>>,
    snapshots: Mutex<Vec<HaltSnapshot>>,
    on_halt: Mutex<Option<HaltHook>>,
}

// SAFETY: `regs` is an owned heap block only touched through volatile
// word accesses; everything else is atomics and mutexes.
unsafe impl Send for Machine {}
unsafe impl Sync for Machine {}

impl Drop for Machine {
    fn drop(&mut self) {
        // SAFETY: allocated by `Bench::new` via `Box::into_raw`.
        unsafe { drop(Box::from_raw(self.regs as *mut [u32; REG_WORDS])) };
    }
}

#[derive(Clone)]
pub struct Bench(Arc<Machine>);

impl Bench {
    pub fn new(cpu_count: u32) -> Self {
        let regs = Box::into_raw(Box::new([0u32; REG_WORDS])) as *mut u32;
        Self(Arc::new(Machine {
            regs,
            cpu_count,
            current_cpu: AtomicU32::new(0),
            map_fails: AtomicBool::new(false),
            slow_map: AtomicBool::new(false),
            map_calls: AtomicUsize::new(0),
            unmap_calls: AtomicUsize::new(0),
            last_map: Mutex::new(None),
            pokes: Mutex::new(Vec::new()),
            work_at_halt: AtomicU32::new(1),
            halts: AtomicU32::new(0),
            irq_enabled: AtomicBool::new(true),
            events: Mutex::new(Vec::new()),
            snapshots: Mutex::new(Vec::new()),
            on_halt: Mutex::new(None),
        }))
    }

    pub fn platform(&self) -> FakePlatform {
        FakePlatform(self.clone())
    }

    pub fn cpu(&self) -> FakeCpu {
        FakeCpu(self.clone())
    }

    // --- registers ---------------------------------------------------------

    pub fn reg(&self, offset: u32) -> u32 {
        assert!((offset as usize) < REG_BYTES);
        unsafe { read_volatile(self.0.regs.add(offset as usize / 4)) }
    }

    pub fn set_reg(&self, offset: u32, value: u32) {
        assert!((offset as usize) < REG_BYTES);
        unsafe { write_volatile(self.0.regs.add(offset as usize / 4), value) }
    }

    pub fn timer_regs(&self) -> HaltSnapshot {
        HaltSnapshot {
            lvt: self.reg(LAPIC_LVT_TIMER),
            icr: self.reg(LAPIC_TIMER_ICR),
        }
    }

    // --- platform script ---------------------------------------------------

    pub fn fail_mapping(&self) {
        self.0.map_fails.store(true, Ordering::Relaxed);
    }

    /// Make `map_mmio` linger so concurrent first entries overlap.
    pub fn slow_mapping(&self) {
        self.0.slow_map.store(true, Ordering::Relaxed);
    }

    pub fn set_current_cpu(&self, cpu: CpuId) {
        self.0.current_cpu.store(cpu.0, Ordering::Relaxed);
    }

    /// The queue turns non-empty once `halts` more halts have happened.
    pub fn work_after(&self, halts: u32) {
        let now = self.0.halts.load(Ordering::SeqCst);
        self.0.work_at_halt.store(now + halts, Ordering::SeqCst);
    }

    pub fn on_halt(&self, hook: impl FnMut(&Bench) + Send + 'static) {
        *self.0.on_halt.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn set_interrupts_enabled(&self, enabled: bool) {
        self.0.irq_enabled.store(enabled, Ordering::SeqCst);
    }

    // --- observations ------------------------------------------------------

    pub fn map_calls(&self) -> usize {
        self.0.map_calls.load(Ordering::SeqCst)
    }

    pub fn unmap_calls(&self) -> usize {
        self.0.unmap_calls.load(Ordering::SeqCst)
    }

    pub fn last_map_request(&self) -> Option<(PhysAddr, usize, MmioProt)> {
        *self.0.last_map.lock().unwrap()
    }

    pub fn pokes(&self) -> Vec<CpuId> {
        self.0.pokes.lock().unwrap().clone()
    }

    pub fn halts(&self) -> u32 {
        self.0.halts.load(Ordering::SeqCst)
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.0.irq_enabled.load(Ordering::SeqCst)
    }

    pub fn cpu_events(&self) -> Vec<CpuEvent> {
        self.0.events.lock().unwrap().clone()
    }

    pub fn halt_snapshots(&self) -> Vec<HaltSnapshot> {
        self.0.snapshots.lock().unwrap().clone()
    }

    fn record(&self, event: CpuEvent) {
        self.0.events.lock().unwrap().push(event);
    }

    fn record_halt(&self) {
        let snapshot = self.timer_regs();
        self.0.snapshots.lock().unwrap().push(snapshot);
        self.0.halts.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = self.0.on_halt.lock().unwrap().as_mut() {
            hook(self);
        }
    }
}

pub struct FakePlatform(Bench);

impl IdlePlatform for FakePlatform {
    fn map_mmio(&self, phys: PhysAddr, size: usize, prot: MmioProt) -> Option<MmioRegion> {
        let machine = &self.0.0;
        machine.map_calls.fetch_add(1, Ordering::SeqCst);
        *machine.last_map.lock().unwrap() = Some((phys, size, prot));
        if machine.slow_map.load(Ordering::Relaxed) {
            std::thread::sleep(Duration::from_millis(5));
        }
        if machine.map_fails.load(Ordering::Relaxed) {
            return None;
        }
        let virt = VirtAddr(machine.regs as u64);
        // SAFETY: the block lives as long as the machine, which outlives
        // every module built on it in these tests.
        unsafe { MmioRegion::from_raw_parts(virt, size.min(REG_BYTES)) }
    }

    fn unmap_mmio(&self, region: MmioRegion) {
        assert_eq!(region.virt_base(), VirtAddr(self.0.0.regs as u64));
        self.0.0.unmap_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn cpu_count(&self) -> u32 {
        self.0.0.cpu_count
    }

    fn is_current_cpu(&self, cpu: CpuId) -> bool {
        self.0.0.current_cpu.load(Ordering::Relaxed) == cpu.0
    }

    fn poke_cpu(&self, cpu: CpuId) {
        self.0.0.pokes.lock().unwrap().push(cpu);
    }

    fn has_runnable_work(&self, _cpu: CpuId) -> bool {
        let machine = &self.0.0;
        machine.halts.load(Ordering::SeqCst) >= machine.work_at_halt.load(Ordering::SeqCst)
    }
}

pub struct FakeCpu(Bench);

impl CpuOps for FakeCpu {
    fn save_and_disable(&self) -> IrqFlags {
        let was_enabled = self.0.0.irq_enabled.swap(false, Ordering::SeqCst);
        self.0.record(CpuEvent::SaveDisable);
        if was_enabled {
            IrqFlags::enabled()
        } else {
            IrqFlags::disabled()
        }
    }

    fn restore(&self, flags: IrqFlags) {
        let enabled = flags.interrupts_enabled();
        self.0.0.irq_enabled.store(enabled, Ordering::SeqCst);
        self.0.record(CpuEvent::Restore { enabled });
    }

    fn enable_and_halt(&self) {
        self.0.record(CpuEvent::EnableHalt);
        self.0.0.irq_enabled.store(true, Ordering::SeqCst);
        self.0.record_halt();
    }

    fn halt_and_disable(&self) {
        self.0.record(CpuEvent::HaltDisable);
        self.0.0.irq_enabled.store(true, Ordering::SeqCst);
        self.0.record_halt();
        self.0.0.irq_enabled.store(false, Ordering::SeqCst);
    }
}
