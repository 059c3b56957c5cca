//! Owned backing buffer shared by all allocators
//!
//! # Safety
//!
//! - The byte region is wrapped in `UnsafeCell` so allocators can hand out
//!   `*mut u8` through `&self`
//! - The region is allocated once, never resized and freed on drop
//! - `RawBuffer` is `Send` but not `Sync`: allocators built on it are
//!   single-writer

use core::cell::UnsafeCell;
use core::ptr::{self, NonNull};

use crate::error::{MemoryError, MemoryResult};

/// Fixed-size owned byte region with interior mutability
pub(crate) struct RawBuffer {
    /// Owned memory buffer
    memory: Box<UnsafeCell<[u8]>>,

    /// Length in bytes (cached)
    len: usize,
}

impl RawBuffer {
    /// Reserves `len` bytes, optionally pre-filled with a debug pattern
    pub(crate) fn new(len: usize, fill: Option<u8>) -> MemoryResult<Self> {
        let mut vec = Vec::new();
        vec.try_reserve_exact(len)
            .map_err(|_| MemoryError::invalid_size(len, "backing buffer allocation failed"))?;
        vec.resize(len, fill.unwrap_or(0));

        let boxed_slice = vec.into_boxed_slice();
        let ptr = Box::into_raw(boxed_slice);
        // SAFETY: Converting Box<[u8]> to Box<UnsafeCell<[u8]>>.
        // - UnsafeCell is repr(transparent), so UnsafeCell<[u8]> has the
        //   layout of [u8] and the slice metadata (length) carries over
        // - Ownership moves through into_raw/from_raw exactly once
        let memory: Box<UnsafeCell<[u8]>> = unsafe { Box::from_raw(ptr as *mut UnsafeCell<[u8]>) };

        Ok(Self { memory, len })
    }

    /// Pointer to the first byte
    #[inline]
    pub(crate) fn base(&self) -> *mut u8 {
        self.memory.get().cast::<u8>()
    }

    /// Buffer length in bytes
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Address of the first byte
    #[inline]
    pub(crate) fn start_addr(&self) -> usize {
        self.base() as usize
    }

    /// Checks if an address lies inside the buffer
    #[inline]
    pub(crate) fn contains(&self, addr: usize) -> bool {
        let start = self.start_addr();
        addr >= start && addr < start + self.len
    }

    /// Byte offset of a pointer into this buffer
    pub(crate) fn offset_of(&self, ptr: *const u8) -> Option<usize> {
        let addr = ptr as usize;
        self.contains(addr).then(|| addr - self.start_addr())
    }

    /// Pointer to the byte at `offset`
    ///
    /// # Safety
    /// `offset` must not exceed the buffer length.
    #[inline]
    pub(crate) unsafe fn ptr_at(&self, offset: usize) -> NonNull<u8> {
        debug_assert!(offset <= self.len);
        // SAFETY: offset is within the allocation (or one past its end) and
        // the base of a live allocation is never null.
        unsafe { NonNull::new_unchecked(self.base().add(offset)) }
    }

    /// Overwrites `[offset, offset + len)` with `byte`
    ///
    /// # Safety
    /// The range must lie inside the buffer and hold no live object that is
    /// still read afterwards.
    #[inline]
    pub(crate) unsafe fn fill(&self, offset: usize, len: usize, byte: u8) {
        debug_assert!(offset + len <= self.len);
        // SAFETY: range is in bounds (caller contract) and the cell grants
        // write access through &self.
        unsafe { ptr::write_bytes(self.base().add(offset), byte, len) }
    }
}
