//! Idle subsystem lifecycle and the hooks the host scheduler calls.
//!
//! The register window is mapped lazily, on the first SMP idle entry of any
//! CPU, behind a `spin::Once`: concurrent first entries make exactly one
//! mapping attempt and the losers wait for its outcome. A failed attempt is
//! remembered and never retried.
//!
//! Idle entries do nothing until `start` has accepted the configuration, and
//! nothing again once `stop` has run. `stop` seals the `Once` itself, so a
//! first mapping racing with it either completes before the unmap or never
//! happens. It still expects no CPU to be inside `enter_idle`; the host must
//! have stopped routing idle entries here first.

use core::sync::atomic::{AtomicU8, Ordering};

use spin::Once;

use idlewatch_lib::{klog_error, klog_info, klog_trace, klog_warn};

use crate::config::IdleConfig;
use crate::error::{IdleError, IdleResult};
use crate::hook::{HaltSlot, HaltStrategy};
use crate::irq::IrqSaveGuard;
use crate::platform::{CpuId, CpuOps, IdlePlatform};
use crate::timer::WatchdogInterval;
use crate::uniprocessor::UniprocessorHalt;
use crate::wakeup;
use crate::watchdog::{IdleCycle, Watchdog};
use crate::window::ApicWindow;

const LIFECYCLE_LOADED: u8 = 0;
const LIFECYCLE_STARTED: u8 = 1;
const LIFECYCLE_STOPPED: u8 = 2;

/// Identity the subsystem registers under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModuleInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// Entry points the host scheduler calls.
pub trait IdleHooks {
    /// Whether this subsystem can run here. Always succeeds: missing
    /// hardware only degrades the watchdog.
    fn probe(&self) -> IdleResult;

    /// `cpu` found its dispatch queue empty. Returns once it has work, or
    /// at once if no watchdog is available or the module is not running.
    fn enter_idle(&self, cpu: CpuId);

    /// End `cpu`'s idle halt early. Called from a different CPU.
    fn leave_idle(&self, cpu: CpuId);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowState {
    /// No SMP idle entry has happened yet.
    Unprobed,
    Mapped,
    /// No watchdog: mapping failed, or `stop` ran before any mapping.
    Unavailable,
    /// Unmapped by `stop`.
    Released,
}

pub struct IdleModule<P: IdlePlatform, C: CpuOps> {
    config: IdleConfig,
    platform: P,
    up_halt: UniprocessorHalt<C>,
    window: Once<Option<ApicWindow>>,
    interval: WatchdogInterval,
    lifecycle: AtomicU8,
}

impl<P: IdlePlatform, C: CpuOps> IdleModule<P, C> {
    pub const INFO: ModuleInfo = ModuleInfo {
        name: "idle",
        description: "Halt CPU(s) when idle",
    };

    pub const fn new(config: IdleConfig, platform: P, cpu: C) -> Self {
        Self {
            config,
            platform,
            up_halt: UniprocessorHalt::new(cpu),
            window: Once::new(),
            interval: WatchdogInterval::new(),
            lifecycle: AtomicU8::new(LIFECYCLE_LOADED),
        }
    }

    #[inline]
    pub fn config(&self) -> &IdleConfig {
        &self.config
    }

    #[inline]
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// The halt strategy `start` installs.
    #[inline]
    pub fn uniprocessor_halt(&self) -> &UniprocessorHalt<C> {
        &self.up_halt
    }

    /// Validate the configuration and swap the uniprocessor halt into `slot`.
    pub fn start<'a>(&'a self, slot: &HaltSlot<'a>) -> IdleResult {
        if let Err(err) = self.config.validate() {
            klog_error!("IDLE: Refusing to start: {}", err);
            return Err(err);
        }

        if let Err(state) = self.lifecycle.compare_exchange(
            LIFECYCLE_LOADED,
            LIFECYCLE_STARTED,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            return Err(if state == LIFECYCLE_STARTED {
                IdleError::AlreadyStarted
            } else {
                IdleError::Stopped
            });
        }

        if let Err(err) = slot.install(&self.up_halt) {
            self.lifecycle.store(LIFECYCLE_LOADED, Ordering::Release);
            klog_warn!("IDLE: Cannot swap halt hook: {}", err);
            return Err(err);
        }

        klog_info!(
            "IDLE: Started, {} halt installed, wakeup vector 0x{:x}",
            self.up_halt.name(),
            self.config.wakeup_vector
        );
        Ok(())
    }

    /// Put the previous halt strategy back and unmap the window if mapped.
    ///
    /// Without a completed `start` this touches nothing and reports
    /// [`IdleError::NotStarted`].
    pub fn stop(&self, slot: &HaltSlot<'_>) -> IdleResult {
        if self
            .lifecycle
            .compare_exchange(
                LIFECYCLE_STARTED,
                LIFECYCLE_STOPPED,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            klog_warn!("IDLE: Stop requested but module was never started");
            return Err(IdleError::NotStarted);
        }

        if let Err(err) = slot.restore() {
            klog_warn!("IDLE: Halt hook already restored elsewhere: {}", err);
        }

        // Waits out an in-flight first mapping; otherwise seals the window
        // unmapped.
        if let Some(window) = self.window.call_once(|| None) {
            window.release(&self.platform);
        }

        klog_info!("IDLE: Stopped");
        Ok(())
    }

    #[inline]
    pub fn is_started(&self) -> bool {
        self.lifecycle.load(Ordering::Acquire) == LIFECYCLE_STARTED
    }

    /// The cached periodic interval, if one has been observed.
    #[inline]
    pub fn watchdog_interval(&self) -> Option<u32> {
        self.interval.get()
    }

    pub fn window_state(&self) -> WindowState {
        match self.window.get() {
            None => WindowState::Unprobed,
            Some(None) => WindowState::Unavailable,
            Some(Some(_)) if self.is_stopped() => WindowState::Released,
            Some(Some(_)) => WindowState::Mapped,
        }
    }

    #[inline]
    fn is_stopped(&self) -> bool {
        self.lifecycle.load(Ordering::Acquire) == LIFECYCLE_STOPPED
    }

    /// The register window, mapping it on first use.
    ///
    /// `None` unless started. The lifecycle is checked again inside the
    /// `Once` so a `stop` that sealed it first wins.
    fn window(&self) -> Option<&ApicWindow> {
        if !self.is_started() {
            return None;
        }
        self.window
            .call_once(|| {
                if !self.is_started() {
                    return None;
                }
                ApicWindow::acquire(&self.platform, self.config.apic_base, self.config.apic_size)
            })
            .as_ref()
    }

    /// One SMP idle entry. `None` when running without a watchdog.
    pub(crate) fn idle_cycle(&self, cpu: CpuId) -> Option<IdleCycle> {
        let _irq = IrqSaveGuard::new(self.up_halt.cpu());

        let window = self.window()?;
        let watchdog = Watchdog {
            platform: &self.platform,
            cpu_ops: self.up_halt.cpu(),
            window,
            interval: &self.interval,
            config: &self.config,
        };
        Some(watchdog.idle_until_work(cpu))
    }
}

impl<P: IdlePlatform, C: CpuOps> IdleHooks for IdleModule<P, C> {
    fn probe(&self) -> IdleResult {
        Ok(())
    }

    fn enter_idle(&self, cpu: CpuId) {
        if !self.is_started() {
            klog_trace!("IDLE: CPU {} entered idle while module inactive", cpu);
            return;
        }

        if self.platform.cpu_count() <= 1 {
            self.up_halt.halt();
            return;
        }

        match self.idle_cycle(cpu) {
            Some(cycle) => klog_trace!(
                "IDLE: CPU {} resumed after {} halt(s), {} arm(s)",
                cpu,
                cycle.halts,
                cycle.arms
            ),
            None => klog_trace!("IDLE: CPU {} has no watchdog, returning", cpu),
        }
    }

    fn leave_idle(&self, cpu: CpuId) {
        wakeup::wake(&self.platform, cpu);
    }
}
