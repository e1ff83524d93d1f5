//! Bounds-checked volatile access to a mapped register block.
//!
//! The mapping itself belongs to the host kernel: an [`MmioRegion`] is only
//! ever built from a virtual range the platform has already mapped, and is
//! handed back to the platform to unmap.

use core::ptr::{read_volatile, write_volatile};

use bitflags::bitflags;
use idlewatch_abi::addr::VirtAddr;

bitflags! {
    /// Access rights requested for an MMIO mapping.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct MmioProt: u32 {
        const READ  = 1 << 0;
        const WRITE = 1 << 1;

        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MmioRegion {
    virt_base: VirtAddr,
    size: usize,
}

impl MmioRegion {
    /// Wrap an already-mapped virtual range.
    ///
    /// Returns `None` for a null base, a zero size, or a range that wraps the
    /// address space.
    ///
    /// # Safety
    /// `virt` must point to `size` bytes that stay mapped, readable and
    /// writable for as long as the region (or any copy of it) is used, and
    /// that tolerate volatile 32-bit accesses at 4-byte aligned offsets.
    pub unsafe fn from_raw_parts(virt: VirtAddr, size: usize) -> Option<Self> {
        if virt.is_null() || size == 0 {
            return None;
        }
        virt.checked_offset(size as u64)?;
        Some(Self {
            virt_base: virt,
            size,
        })
    }

    #[inline]
    pub fn read<T: Copy>(&self, offset: usize) -> T {
        let size = core::mem::size_of::<T>();
        assert!(
            self.is_valid_offset(offset, size),
            "MMIO read out of bounds: offset={}, size={}, region_size={}",
            offset,
            size,
            self.size
        );
        debug_assert!(
            offset % size == 0,
            "MMIO read misaligned: offset={}, align={}",
            offset,
            size
        );

        let ptr = (self.virt_base.as_u64() + offset as u64) as *const T;
        // SAFETY: in bounds of a range the constructor's caller vouched for.
        unsafe { read_volatile(ptr) }
    }

    #[inline]
    pub fn write<T: Copy>(&self, offset: usize, value: T) {
        let size = core::mem::size_of::<T>();
        assert!(
            self.is_valid_offset(offset, size),
            "MMIO write out of bounds: offset={}, size={}, region_size={}",
            offset,
            size,
            self.size
        );
        debug_assert!(
            offset % size == 0,
            "MMIO write misaligned: offset={}, align={}",
            offset,
            size
        );

        let ptr = (self.virt_base.as_u64() + offset as u64) as *mut T;
        // SAFETY: in bounds of a range the constructor's caller vouched for.
        unsafe { write_volatile(ptr, value) }
    }

    #[inline]
    pub fn read_u32(&self, offset: usize) -> u32 {
        self.read(offset)
    }

    #[inline]
    pub fn write_u32(&self, offset: usize, value: u32) {
        self.write(offset, value)
    }

    #[inline]
    pub fn virt_base(&self) -> VirtAddr {
        self.virt_base
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_valid_offset(&self, offset: usize, access_size: usize) -> bool {
        offset
            .checked_add(access_size)
            .is_some_and(|end| end <= self.size)
    }
}

// SAFETY: the region is a plain address range; every access is a single
// volatile load or store, which the hardware serialises per register.
unsafe impl Send for MmioRegion {}
unsafe impl Sync for MmioRegion {}
