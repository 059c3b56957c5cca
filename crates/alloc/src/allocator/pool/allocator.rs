//! Fixed-size pool allocator
//!
//! # Safety
//!
//! - Slot `i` occupies `[i * stride, (i + 1) * stride)` of the buffer
//! - The pointer handed out for a slot is its raw start aligned with the
//!   shift-byte layout the stacks use, so a stride of
//!   `max(size_of::<T>(), size_of::<usize>()) + align` always leaves room
//!   for a `T` after the shift
//! - The free list lives in a side table of [`SlotState`]s rather than inside
//!   the slots, so user writes cannot corrupt it and every release is
//!   checked against the slot's state
//!
//! ## Invariants
//!
//! - `free_count + used_count == capacity`
//! - Every index reachable from `first_free` is `Free`, and no `Free` slot
//!   is reachable twice

use core::cell::Cell;
use core::fmt;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};

#[cfg(feature = "logging")]
use tracing::{debug, error, trace};

use super::{PoolConfig, PoolStats};
use crate::align::{self, Align};
use crate::core::{AllocatorStats, MemoryUsage, RawBuffer, Resettable, StatisticsProvider, StatsCounter};
use crate::error::{MemoryError, MemoryResult};

/// Slot bookkeeping: a tagged free-list link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Free { next: Option<usize> },
    InUse,
}

/// Pool of fixed-size slots for values of type `T`
///
/// Allocation pops the most recently released slot (LIFO); a fresh pool
/// hands slots out in address order.
pub struct PoolAllocator<T> {
    memory: RawBuffer,
    slots: Box<[Cell<SlotState>]>,
    first_free: Cell<Option<usize>>,
    used: Cell<usize>,
    stride: usize,
    align: Align,
    config: PoolConfig,
    stats: StatsCounter,
    _marker: PhantomData<T>,
}

impl<T> PoolAllocator<T> {
    /// Creates a pool of `num_items` slots aligned to at least `align`
    ///
    /// The effective alignment is `max(align, align_of::<T>())`.
    pub fn with_config(num_items: usize, align: Align, config: PoolConfig) -> MemoryResult<Self> {
        if num_items == 0 {
            return Err(MemoryError::invalid_size(num_items, "pool must hold at least one item"));
        }

        let align = align.at_least_of::<T>()?;
        let stride = size_of::<T>()
            .max(size_of::<usize>())
            .checked_add(align.get())
            .ok_or_else(|| MemoryError::size_overflow("pool slot stride"))?;
        let total = stride
            .checked_mul(num_items)
            .ok_or_else(|| MemoryError::size_overflow("pool buffer size"))?;

        let mut slots = Vec::new();
        slots
            .try_reserve_exact(num_items)
            .map_err(|_| MemoryError::invalid_size(num_items, "pool slot table allocation failed"))?;
        slots.resize_with(num_items, || Cell::new(SlotState::InUse));
        let slots = slots.into_boxed_slice();

        let memory = RawBuffer::new(total, config.alloc_pattern)?;

        #[cfg(feature = "logging")]
        debug!(
            num_items,
            align = align.get(),
            stride,
            type_name = core::any::type_name::<T>(),
            "created pool allocator"
        );

        let pool = Self {
            memory,
            slots,
            first_free: Cell::new(None),
            used: Cell::new(0),
            stride,
            align,
            stats: StatsCounter::new(config.track_stats),
            config,
            _marker: PhantomData,
        };
        pool.rebuild_free_list();
        Ok(pool)
    }

    /// Creates a pool with default configuration
    pub fn new(num_items: usize, align: Align) -> MemoryResult<Self> {
        Self::with_config(num_items, align, PoolConfig::default())
    }

    /// Creates a production-optimized pool
    pub fn production(num_items: usize, align: Align) -> MemoryResult<Self> {
        Self::with_config(num_items, align, PoolConfig::production())
    }

    /// Creates a debug-optimized pool
    pub fn debug(num_items: usize, align: Align) -> MemoryResult<Self> {
        Self::with_config(num_items, align, PoolConfig::debug())
    }

    /// Creates a performance-optimized pool
    pub fn performance(num_items: usize, align: Align) -> MemoryResult<Self> {
        Self::with_config(num_items, align, PoolConfig::performance())
    }

    /// Returns the active configuration
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Total number of slots
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slots currently handed out
    #[inline]
    pub fn used_count(&self) -> usize {
        self.used.get()
    }

    /// Slots available for allocation
    #[inline]
    pub fn free_count(&self) -> usize {
        self.capacity() - self.used.get()
    }

    /// Effective slot alignment
    #[inline]
    pub fn align(&self) -> Align {
        self.align
    }

    /// Distance in bytes between consecutive slots
    #[inline]
    pub fn slot_size(&self) -> usize {
        self.stride
    }

    /// Checks if every slot is in use
    pub fn is_full(&self) -> bool {
        self.free_count() == 0
    }

    /// Checks if no slot is in use
    pub fn is_empty(&self) -> bool {
        self.used.get() == 0
    }

    /// Checks if a pointer lies inside this pool's buffer
    pub fn contains(&self, ptr: *const T) -> bool {
        self.memory.contains(ptr as usize)
    }

    /// Pops a free slot
    ///
    /// Returns `None` when every slot is in use.
    pub fn alloc(&self) -> Option<NonNull<T>> {
        let Some(index) = self.first_free.get() else {
            self.stats.record_failure();
            #[cfg(feature = "logging")]
            trace!(capacity = self.capacity(), "pool allocation failed");
            return None;
        };

        let SlotState::Free { next } = self.slots[index].get() else {
            #[cfg(feature = "logging")]
            error!(slot = index, "pool free list points at a slot in use");
            self.stats.record_failure();
            return None;
        };

        self.first_free.set(next);
        self.slots[index].set(SlotState::InUse);
        self.used.set(self.used.get() + 1);
        self.stats.record_alloc(self.used.get() * self.stride);

        let offset = index * self.stride;
        if let Some(pattern) = self.config.alloc_pattern {
            // SAFETY: the slot lies inside the buffer and was free.
            unsafe { self.memory.fill(offset, self.stride, pattern) };
        }
        // SAFETY: offset + stride <= buffer length and the slot has `align`
        // bytes of headroom for the shift.
        let aligned = unsafe { align::align_ptr_store(self.memory.ptr_at(offset), self.align) };
        Some(aligned.cast())
    }

    /// Places a `T` built by `init` in a free slot
    ///
    /// `init` runs only once a slot is reserved.
    pub fn new_with<F>(&self, init: F) -> Option<NonNull<T>>
    where
        F: FnOnce() -> T,
    {
        let ptr = self.alloc()?;
        // SAFETY: the slot is reserved, aligned for T and large enough.
        unsafe { ptr.as_ptr().write(init()) };
        Some(ptr)
    }

    /// Returns a slot to the pool without dropping its contents
    ///
    /// A null pointer is a no-op.
    ///
    /// # Errors
    /// [`MemoryError::InvalidPointer`] for pointers that are not the start
    /// of one of this pool's slots, [`MemoryError::DoubleFree`] for slots
    /// that are already free. The pool is unchanged on error.
    ///
    /// # Safety
    /// The slot's contents must not be accessed afterwards.
    pub unsafe fn free(&self, ptr: *mut T) -> MemoryResult<()> {
        if ptr.is_null() {
            return Ok(());
        }
        let index = self.slot_index(ptr)?;
        self.release_slot(index);
        Ok(())
    }

    /// Drops the value in a slot and returns the slot to the pool
    ///
    /// Validation happens before the drop, so an invalid pointer is never
    /// dropped. A null pointer is a no-op.
    ///
    /// # Errors
    /// Same as [`free`](Self::free).
    ///
    /// # Safety
    /// `ptr`, when valid, must point at an initialized `T` that is not
    /// accessed afterwards.
    pub unsafe fn delete(&self, ptr: *mut T) -> MemoryResult<()> {
        if ptr.is_null() {
            return Ok(());
        }
        let index = self.slot_index(ptr)?;
        // SAFETY: caller contract; the slot is in use.
        unsafe { ptr::drop_in_place(ptr) };
        self.release_slot(index);
        Ok(())
    }

    /// Snapshot of slot usage
    pub fn stats(&self) -> PoolStats {
        let snapshot = self.stats.snapshot(self.used_count() * self.stride);
        PoolStats {
            total_allocs: snapshot.allocation_count,
            total_deallocs: snapshot.deallocation_count,
            peak_usage: snapshot.peak_allocated_bytes,
            current_usage: snapshot.allocated_bytes,
            block_size: self.stride,
            block_count: self.capacity(),
            free_blocks: self.free_count(),
        }
    }

    /// Maps a handed-out pointer back to its slot index
    ///
    /// The pointer must be exactly the address `alloc` returns for its slot
    /// and the slot must be in use. The expected address is recomputed from
    /// the slot base rather than read from the shift byte, which the
    /// dealloc pattern overwrites.
    fn slot_index(&self, ptr: *mut T) -> MemoryResult<usize> {
        let Some(offset) = self.memory.offset_of(ptr.cast()) else {
            return Err(MemoryError::invalid_pointer("pointer does not belong to this pool"));
        };

        let index = offset / self.stride;
        let base = self.memory.start_addr() + index * self.stride;
        if base + align::shift_for(base, self.align) != ptr as usize {
            return Err(MemoryError::invalid_pointer("pointer is not the start of a pool slot"));
        }

        match self.slots[index].get() {
            SlotState::InUse => Ok(index),
            SlotState::Free { .. } => Err(MemoryError::double_free(index)),
        }
    }

    /// Pushes an in-use slot onto the free list
    fn release_slot(&self, index: usize) {
        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: the slot lies inside the buffer and is being released.
            unsafe { self.memory.fill(index * self.stride, self.stride, pattern) };
        }
        self.slots[index].set(SlotState::Free {
            next: self.first_free.get(),
        });
        self.first_free.set(Some(index));
        self.used.set(self.used.get() - 1);
        self.stats.record_dealloc();
    }

    /// Marks every slot free, chained in address order
    fn rebuild_free_list(&self) {
        let count = self.slots.len();
        for (index, slot) in self.slots.iter().enumerate() {
            let next = index + 1;
            slot.set(SlotState::Free {
                next: (next < count).then_some(next),
            });
        }
        self.first_free.set(Some(0));
        self.used.set(0);
    }
}

impl<T> fmt::Debug for PoolAllocator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolAllocator")
            .field("capacity", &self.capacity())
            .field("used", &self.used_count())
            .field("stride", &self.stride)
            .field("align", &self.align)
            .field("config", &self.config)
            .finish()
    }
}

impl<T> MemoryUsage for PoolAllocator<T> {
    fn used_memory(&self) -> usize {
        self.used_count() * self.stride
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.free_count() * self.stride)
    }
}

impl<T> Resettable for PoolAllocator<T> {
    /// Marks every slot free without dropping their contents
    unsafe fn reset(&self) {
        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: caller guarantees no slot is accessed afterwards.
            unsafe { self.memory.fill(0, self.memory.len(), pattern) };
        }
        self.rebuild_free_list();
        self.stats.record_dealloc();
    }
}

impl<T> StatisticsProvider for PoolAllocator<T> {
    fn statistics(&self) -> AllocatorStats {
        self.stats.snapshot(self.used_memory())
    }

    fn reset_statistics(&self) {
        self.stats.reset();
    }

    fn statistics_enabled(&self) -> bool {
        self.stats.enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_includes_alignment() {
        let pool = PoolAllocator::<u8>::performance(4, Align::new(16).unwrap()).unwrap();
        assert_eq!(pool.slot_size(), size_of::<usize>() + 16);
        assert_eq!(pool.align().get(), 16);
    }

    #[test]
    fn test_effective_alignment_follows_type() {
        let pool = PoolAllocator::<u64>::performance(2, Align::ONE).unwrap();
        assert_eq!(pool.align().get(), align_of::<u64>());
        let slot = pool.alloc().unwrap();
        assert!(align::is_aligned_ptr(slot.as_ptr(), align_of::<u64>()));
    }

    #[test]
    fn test_fresh_pool_hands_out_in_address_order() {
        let pool = PoolAllocator::<u32>::performance(3, Align::ONE).unwrap();
        let a = pool.alloc().unwrap().as_ptr() as usize;
        let b = pool.alloc().unwrap().as_ptr() as usize;
        let c = pool.alloc().unwrap().as_ptr() as usize;
        assert!(a < b && b < c);
        assert!(pool.alloc().is_none());
    }

    #[test]
    fn test_rejects_interior_pointer() {
        let pool = PoolAllocator::<u64>::performance(2, Align::ONE).unwrap();
        let slot = pool.alloc().unwrap();
        let interior = slot.as_ptr().cast::<u8>().wrapping_add(1).cast::<u64>();
        // SAFETY: validation rejects the pointer before any access.
        let error = unsafe { pool.free(interior) }.unwrap_err();
        assert_eq!(error.code(), "MEM:POOL:POINTER");
        assert_eq!(pool.used_count(), 1);
    }

    #[test]
    fn test_reset_frees_everything() {
        let pool = PoolAllocator::<u32>::performance(2, Align::ONE).unwrap();
        pool.alloc().unwrap();
        pool.alloc().unwrap();
        assert!(pool.is_full());
        // SAFETY: no slot is used again.
        unsafe { pool.reset() };
        assert!(pool.is_empty());
        assert_eq!(pool.free_count(), 2);
    }

    #[test]
    fn test_oversized_slot_table_is_an_error() {
        // The byte buffer size still fits in usize; the slot table does not.
        let num_items = usize::MAX / 16 + 1;
        let error = PoolAllocator::<u8>::performance(num_items, Align::ONE).unwrap_err();
        assert_eq!(error.code(), "MEM:ALLOC:SIZE");
        assert!(error.to_string().contains("slot table"));
    }
}
