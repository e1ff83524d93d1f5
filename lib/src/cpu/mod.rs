pub mod core;
pub mod interrupts;

pub use self::core::*;
pub use interrupts::*;
