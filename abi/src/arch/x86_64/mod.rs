pub mod apic;
pub mod vectors;

pub use apic::{LvtTimer, TimerModeBits};
pub use vectors::*;
