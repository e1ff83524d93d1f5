//! Error type for the idle subsystem's lifecycle and configuration.
//!
//! The per-CPU entry points (`enter_idle`, `leave_idle`) never fail: a
//! missing or unmappable APIC degrades to halting without a watchdog. Only
//! start/stop and their preconditions report errors.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleError {
    /// `stop` without a completed `start`.
    NotStarted,
    AlreadyStarted,
    /// The module was stopped; a fresh instance is needed to start again.
    Stopped,
    /// The halt slot already carries a swapped-in strategy.
    HookAlreadyInstalled,
    /// `restore` on a halt slot with nothing swapped in.
    HookNotInstalled,
    /// The wakeup vector collides with a vector owned by someone else.
    VectorConflict { vector: u8 },
    /// The wakeup vector lies in the CPU exception range.
    InvalidVector { vector: u8 },
    ZeroInterval,
    /// The configured register window does not reach the timer registers.
    WindowTooSmall { size: usize },
}

impl fmt::Display for IdleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "idle module was never started"),
            Self::AlreadyStarted => write!(f, "idle module already started"),
            Self::Stopped => write!(f, "idle module has been stopped"),
            Self::HookAlreadyInstalled => write!(f, "halt hook already swapped"),
            Self::HookNotInstalled => write!(f, "halt hook was never swapped"),
            Self::VectorConflict { vector } => {
                write!(f, "wakeup vector {:#x} is reserved", vector)
            }
            Self::InvalidVector { vector } => {
                write!(f, "wakeup vector {:#x} is a CPU exception vector", vector)
            }
            Self::ZeroInterval => write!(f, "watchdog interval must be non-zero"),
            Self::WindowTooSmall { size } => {
                write!(f, "register window of {:#x} bytes misses the timer registers", size)
            }
        }
    }
}

/// Convenience result type for idle lifecycle operations.
pub type IdleResult<T = ()> = Result<T, IdleError>;
