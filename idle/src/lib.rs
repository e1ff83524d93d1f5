//! CPU idle entry for SMP and uniprocessor x86_64 systems.
//!
//! When a CPU's dispatch queue runs dry the host scheduler calls
//! [`IdleHooks::enter_idle`]. On a uniprocessor the CPU simply halts until
//! the next interrupt. On SMP the CPU halts with its Local APIC timer armed
//! as a one-shot watchdog, so it re-checks its queue at least once per
//! watchdog interval even if nobody pokes it. A CPU whose LAPIC timer is
//! already running periodic (the clock owner) is left alone: its tick is
//! the watchdog.
//!
//! The host kernel supplies the primitives through [`IdlePlatform`] and
//! [`CpuOps`], and holds a [`HaltSlot`] that [`IdleModule::start`] points
//! at the uniprocessor halt.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod config;
pub mod error;
pub mod hook;
pub mod irq;
pub mod module;
pub mod platform;
pub mod timer;
pub mod uniprocessor;
pub mod wakeup;
pub mod watchdog;
pub mod window;

#[cfg(test)]
mod test_support;

pub use config::{DEFAULT_WATCHDOG_INTERVAL, IdleConfig};
pub use error::{IdleError, IdleResult};
pub use hook::{HaltSlot, HaltStrategy, NULL_HALT, NullHalt};
pub use irq::IrqSaveGuard;
pub use module::{IdleHooks, IdleModule, ModuleInfo, WindowState};
pub use platform::{CpuId, CpuOps, IdlePlatform, X86Cpu};
pub use timer::{TimerMode, WatchdogInterval};
pub use uniprocessor::UniprocessorHalt;
pub use watchdog::IdleCycle;
pub use window::ApicWindow;
