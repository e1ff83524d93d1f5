//! The scheduler's "what to do when idle" hook.
//!
//! The host scheduler owns a [`HaltSlot`] and calls [`HaltSlot::halt`] from
//! its idle loop. A subsystem swaps its own [`HaltStrategy`] in with
//! [`HaltSlot::install`] and puts the previous one back with
//! [`HaltSlot::restore`]. Only one swap may be outstanding at a time.

use core::ptr;

use spin::RwLock;

use crate::error::{IdleError, IdleResult};

/// One idle action of the executing CPU.
pub trait HaltStrategy: Sync {
    fn halt(&self);

    fn name(&self) -> &'static str;
}

/// The platform default: return immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHalt;

impl HaltStrategy for NullHalt {
    #[inline]
    fn halt(&self) {}

    fn name(&self) -> &'static str {
        "null"
    }
}

pub static NULL_HALT: NullHalt = NullHalt;

struct SlotState<'a> {
    active: &'a dyn HaltStrategy,
    saved: Option<&'a dyn HaltStrategy>,
}

pub struct HaltSlot<'a> {
    state: RwLock<SlotState<'a>>,
}

impl<'a> HaltSlot<'a> {
    pub const fn new(default: &'a dyn HaltStrategy) -> Self {
        Self {
            state: RwLock::new(SlotState {
                active: default,
                saved: None,
            }),
        }
    }

    /// Run the active strategy.
    ///
    /// The lock is dropped before halting; other CPUs idle concurrently.
    #[inline]
    pub fn halt(&self) {
        let active = self.state.read().active;
        active.halt();
    }

    pub fn active_name(&self) -> &'static str {
        self.state.read().active.name()
    }

    /// Whether `strategy` is the one currently active.
    pub fn is_active(&self, strategy: &dyn HaltStrategy) -> bool {
        ptr::addr_eq(self.state.read().active, strategy)
    }

    pub fn is_installed(&self) -> bool {
        self.state.read().saved.is_some()
    }

    /// Make `strategy` active, remembering the current one.
    pub fn install(&self, strategy: &'a dyn HaltStrategy) -> IdleResult {
        let mut state = self.state.write();
        if state.saved.is_some() {
            return Err(IdleError::HookAlreadyInstalled);
        }
        state.saved = Some(state.active);
        state.active = strategy;
        Ok(())
    }

    /// Reinstate the strategy that was active before [`HaltSlot::install`].
    pub fn restore(&self) -> IdleResult {
        let mut state = self.state.write();
        let previous = state.saved.take().ok_or(IdleError::HookNotInstalled)?;
        state.active = previous;
        Ok(())
    }
}
