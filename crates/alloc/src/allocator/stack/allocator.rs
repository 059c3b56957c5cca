//! Main stack allocator implementation
//!
//! # Safety
//!
//! This module implements a single-threaded LIFO stack allocator:
//! - Memory buffer owned by a [`RawBuffer`] for interior mutability
//! - `Cell` top cursor, so allocation works through `&self`
//! - Release happens only by rewinding to a [`StackMarker`] or clearing
//!
//! ## Invariants
//!
//! - `0 <= top <= capacity` at all times
//! - Every returned pointer lies in `[base, base + capacity)`
//! - A marker is accepted only if its position is not above `top`
//! - Aligned blocks carry their shift in the byte right before them

use core::alloc::Layout;
use core::cell::Cell;
use core::fmt;
use core::ptr::{self, NonNull};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

use super::{StackConfig, StackMarker};
use crate::align::{self, Align, align_up};
use crate::core::{AllocatorStats, MemoryUsage, RawBuffer, Resettable, StatisticsProvider, StatsCounter};
use crate::error::{MemoryError, MemoryResult};

/// Stack allocator that supports LIFO allocation and deallocation
///
/// Allocation bumps a cursor forward; deallocation rewinds it to a
/// previously captured marker, releasing everything allocated since.
///
/// # Memory Layout
/// ```text
/// [start]----[alloc1]----[alloc2]----[alloc3]----[top]----[free]----[end]
///             <------ allocated ------>         <-- available -->
/// ```
pub struct StackAllocator {
    /// Owned memory buffer
    memory: RawBuffer,

    /// Configuration
    config: StackConfig,

    /// Offset of the first free byte
    top: Cell<usize>,

    /// Statistics (only tracked if enabled)
    stats: StatsCounter,
}

impl StackAllocator {
    /// Creates a new stack allocator with custom configuration
    ///
    /// Fails for a zero capacity, for the capacity reserved by
    /// [`StackMarker::INVALID`] and when the buffer cannot be reserved.
    pub fn with_config(capacity: usize, config: StackConfig) -> MemoryResult<Self> {
        if capacity == 0 {
            return Err(MemoryError::invalid_size(capacity, "stack capacity cannot be zero"));
        }
        if capacity == StackMarker::INVALID.position() {
            return Err(MemoryError::invalid_size(
                capacity,
                "stack capacity collides with the invalid marker value",
            ));
        }

        let memory = RawBuffer::new(capacity, config.alloc_pattern)?;

        #[cfg(feature = "logging")]
        debug!(capacity, track_stats = config.track_stats, "created stack allocator");

        Ok(Self {
            memory,
            stats: StatsCounter::new(config.track_stats),
            config,
            top: Cell::new(0),
        })
    }

    /// Creates a new stack allocator with default configuration
    pub fn new(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, StackConfig::default())
    }

    /// Creates a production-optimized stack allocator
    pub fn production(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, StackConfig::production())
    }

    /// Creates a debug-optimized stack allocator
    pub fn debug(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, StackConfig::debug())
    }

    /// Creates a performance-optimized stack allocator
    pub fn performance(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, StackConfig::performance())
    }

    /// Returns the active configuration
    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Total size of the backing buffer in bytes
    #[inline]
    pub fn capacity(&self) -> usize {
        self.memory.len()
    }

    /// Bytes between the start of the buffer and the cursor
    #[inline]
    pub fn used(&self) -> usize {
        self.top.get()
    }

    /// Bytes still available above the cursor
    #[inline]
    pub fn available(&self) -> usize {
        self.capacity() - self.top.get()
    }

    /// Checks if nothing is allocated
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.top.get() == 0
    }

    /// Checks if a pointer lies inside this allocator's buffer
    pub fn contains<T>(&self, ptr: *const T) -> bool {
        self.memory.contains(ptr as usize)
    }

    /// Allocates `n_bytes` at the current top
    ///
    /// Returns `None` without changing any state when the request does not
    /// fit. A zero-byte request succeeds while the cursor is inside the
    /// buffer and returns the current top.
    pub fn alloc(&self, n_bytes: usize) -> Option<NonNull<u8>> {
        let top = self.top.get();
        match top.checked_add(n_bytes).filter(|&end| end <= self.capacity()) {
            // SAFETY: top <= end <= capacity.
            Some(end) => Some(unsafe { self.bump(top, end) }),
            None => {
                self.record_failure(n_bytes);
                None
            },
        }
    }

    /// Allocates `n_bytes` aligned to `align`
    ///
    /// Reserves `n_bytes + align` bytes and records the shift in the byte
    /// before the returned pointer, so [`aligned_base`](Self::aligned_base)
    /// can recover the raw start.
    pub fn alloc_aligned(&self, n_bytes: usize, align: Align) -> Option<NonNull<u8>> {
        let Some(total) = n_bytes.checked_add(align.get()) else {
            self.record_failure(n_bytes);
            return None;
        };
        let raw = self.alloc(total)?;
        // SAFETY: `raw` is valid for `total >= align` bytes.
        Some(unsafe { align::align_ptr_store(raw, align) })
    }

    /// Recovers the raw start of a block returned by
    /// [`alloc_aligned`](Self::alloc_aligned)
    ///
    /// A null pointer maps to null.
    ///
    /// # Safety
    /// `aligned` must be null or a pointer returned by `alloc_aligned` on this
    /// allocator that has not been released, with its shift byte intact.
    pub unsafe fn aligned_base(&self, aligned: *mut u8) -> *mut u8 {
        match NonNull::new(aligned) {
            // SAFETY: caller contract.
            Some(aligned) => unsafe { align::unalign_ptr(aligned).as_ptr() },
            None => ptr::null_mut(),
        }
    }

    /// Captures the current top
    #[inline]
    pub fn marker(&self) -> StackMarker {
        StackMarker {
            position: self.top.get(),
        }
    }

    /// Validates a marker against the current top without rewinding
    pub fn check_marker(&self, marker: StackMarker) -> MemoryResult<()> {
        let top = self.top.get();
        if marker.position > top {
            return Err(MemoryError::invalid_marker(marker.position, top));
        }
        Ok(())
    }

    /// Rewinds the top to `marker`, releasing everything allocated after it
    ///
    /// Fails with [`MemoryError::InvalidMarker`] and leaves the cursor
    /// untouched if the marker lies above the current top, which happens
    /// when it was already released by rewinding to a lower marker.
    ///
    /// # Safety
    /// No object allocated after `marker` may be accessed afterwards.
    pub unsafe fn free_to_marker(&self, marker: StackMarker) -> MemoryResult<()> {
        self.check_marker(marker)?;
        let top = self.top.get();

        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: marker.position <= top <= capacity and the range is
            // being released.
            unsafe { self.memory.fill(marker.position, top - marker.position, pattern) };
        }

        self.top.set(marker.position);
        self.stats.record_dealloc();

        #[cfg(feature = "logging")]
        trace!(from = top, to = marker.position, "stack rewound");

        Ok(())
    }

    /// Rewinds the top to the start of the buffer
    ///
    /// # Safety
    /// No object allocated from this allocator may be accessed afterwards.
    pub unsafe fn clear(&self) {
        let top = self.top.get();
        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: [0, top) is inside the buffer and being released.
            unsafe { self.memory.fill(0, top, pattern) };
        }
        self.top.set(0);
        self.stats.record_dealloc();
    }

    /// Places a `T` built by `init` at its natural alignment
    ///
    /// `init` runs only after the memory is reserved, so it is never called
    /// when the allocator is exhausted.
    pub fn new_with<T, F>(&self, init: F) -> Option<NonNull<T>>
    where
        F: FnOnce() -> T,
    {
        let ptr = self.alloc_layout(Layout::new::<T>())?.cast::<T>();
        // SAFETY: the block is fresh, sized and aligned for T.
        unsafe { ptr.as_ptr().write(init()) };
        Some(ptr)
    }

    /// Places a `T` built by `init` at `align`, using the shift-byte layout
    ///
    /// The effective alignment is never lower than `T`'s own. Returns
    /// `Ok(None)` when the stack is exhausted.
    ///
    /// # Errors
    /// [`MemoryError::InvalidAlignment`] if `T` is aligned beyond
    /// [`MAX_ALIGN`](crate::MAX_ALIGN); no amount of free space satisfies it.
    pub fn new_aligned_with<T, F>(&self, align: Align, init: F) -> MemoryResult<Option<NonNull<T>>>
    where
        F: FnOnce() -> T,
    {
        let align = align.at_least_of::<T>()?;
        let Some(ptr) = self.alloc_aligned(size_of::<T>(), align) else {
            return Ok(None);
        };
        let ptr = ptr.cast::<T>();
        // SAFETY: alloc_aligned leaves size_of::<T>() usable bytes aligned to
        // at least align_of::<T>().
        unsafe { ptr.as_ptr().write(init()) };
        Ok(Some(ptr))
    }

    /// Bytes a typed request of `layout` would consume at the current top
    pub(crate) fn layout_cost(&self, layout: Layout) -> usize {
        let addr = self.memory.start_addr() + self.top.get();
        (align_up(addr, layout.align()) - addr).saturating_add(layout.size())
    }

    /// Reserves a block for `layout`, padding the cursor up to its alignment
    fn alloc_layout(&self, layout: Layout) -> Option<NonNull<u8>> {
        let top = self.top.get();
        let addr = self.memory.start_addr() + top;
        let start = top + (align_up(addr, layout.align()) - addr);

        match start
            .checked_add(layout.size())
            .filter(|&end| end <= self.capacity())
        {
            // SAFETY: top <= start <= end <= capacity.
            Some(end) => Some(unsafe { self.bump(start, end) }),
            None => {
                self.record_failure(layout.size());
                None
            },
        }
    }

    /// Moves the cursor to `end` and returns the block starting at `start`
    ///
    /// # Safety
    /// `top <= start <= end <= capacity`.
    #[inline]
    unsafe fn bump(&self, start: usize, end: usize) -> NonNull<u8> {
        if let Some(pattern) = self.config.alloc_pattern {
            // SAFETY: [start, end) is inside the buffer and not yet handed out.
            unsafe { self.memory.fill(start, end - start, pattern) };
        }
        self.top.set(end);
        self.stats.record_alloc(end);
        // SAFETY: start <= capacity.
        unsafe { self.memory.ptr_at(start) }
    }

    #[inline]
    fn record_failure(&self, requested: usize) {
        self.stats.record_failure();

        #[cfg(feature = "logging")]
        trace!(
            requested,
            used = self.top.get(),
            capacity = self.capacity(),
            "stack allocation failed"
        );
        #[cfg(not(feature = "logging"))]
        let _ = requested;
    }
}

impl fmt::Debug for StackAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackAllocator")
            .field("capacity", &self.capacity())
            .field("used", &self.used())
            .field("config", &self.config)
            .finish()
    }
}

impl MemoryUsage for StackAllocator {
    fn used_memory(&self) -> usize {
        self.used()
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.available())
    }
}

impl Resettable for StackAllocator {
    unsafe fn reset(&self) {
        // SAFETY: forwarded caller contract.
        unsafe { self.clear() }
    }
}

impl StatisticsProvider for StackAllocator {
    fn statistics(&self) -> AllocatorStats {
        self.stats.snapshot(self.used())
    }

    fn reset_statistics(&self) {
        self.stats.reset();
    }

    fn statistics_enabled(&self) -> bool {
        self.stats.enabled()
    }
}
