#![no_std]

pub mod cpu;
pub mod klog;
pub mod mmio;

pub use klog::{KlogLevel, klog_get_level, klog_init, klog_register_backend, klog_set_level};
pub use mmio::{MmioProt, MmioRegion};
