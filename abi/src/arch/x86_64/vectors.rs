//! Interrupt vector assignments relevant to the idle path.

/// Vectors 0-31 are reserved for CPU exceptions.
pub const EXCEPTION_VECTOR_LIMIT: u8 = 32;

/// Clock tick vector.
/// The boot CPU's LAPIC timer fires on this vector when it runs periodic.
pub const CLOCK_TICK_VECTOR: u8 = 0xEC;

/// Generic poke IPI vector.
/// Sent by the scheduler to make another CPU re-examine its dispatch queue.
pub const POKE_IPI_VECTOR: u8 = 0xFC;

/// Idle watchdog vector (0xA0).
/// Delivered by the one-shot LAPIC timer armed on an idle CPU. The dispatch
/// layer treats it as spurious; its only job is to end a `hlt`. Sharing the
/// clock or poke vector deadlocks the dispatcher or the clock handler.
pub const IDLE_WAKEUP_VECTOR: u8 = 0xA0;
