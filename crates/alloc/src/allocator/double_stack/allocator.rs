//! Double-ended stack allocator
//!
//! # Safety
//!
//! - `left` is the first free byte of the LEFT stack, `right` the lowest used
//!   byte of the RIGHT stack
//! - `0 <= left <= right <= capacity` at all times, so the sides never
//!   overlap
//! - Each side is released only through its own markers or clears

use core::alloc::Layout;
use core::cell::Cell;
use core::fmt;
use core::ptr::NonNull;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

use super::{DoubleStackMarker, Side};
use crate::align::{self, Align, align_down, align_up};
use crate::allocator::stack::{StackConfig, StackMarker};
use crate::core::{AllocatorStats, MemoryUsage, RawBuffer, Resettable, StatisticsProvider, StatsCounter};
use crate::error::{MemoryError, MemoryResult};

/// Two LIFO stacks growing toward each other in one buffer
///
/// # Memory Layout
/// ```text
/// [start]--[left allocs]-->[left]....free....[right]<--[right allocs]--[end]
/// ```
pub struct DoubleStackAllocator {
    memory: RawBuffer,
    config: StackConfig,
    left: Cell<usize>,
    right: Cell<usize>,
    stats: StatsCounter,
}

impl DoubleStackAllocator {
    /// Creates a new double stack allocator with custom configuration
    ///
    /// Validation matches [`StackAllocator`](crate::allocator::StackAllocator).
    pub fn with_config(capacity: usize, config: StackConfig) -> MemoryResult<Self> {
        if capacity == 0 {
            return Err(MemoryError::invalid_size(capacity, "double stack capacity cannot be zero"));
        }
        if capacity == StackMarker::INVALID.position() {
            return Err(MemoryError::invalid_size(
                capacity,
                "double stack capacity collides with the invalid marker value",
            ));
        }

        let memory = RawBuffer::new(capacity, config.alloc_pattern)?;

        #[cfg(feature = "logging")]
        debug!(capacity, track_stats = config.track_stats, "created double stack allocator");

        Ok(Self {
            memory,
            stats: StatsCounter::new(config.track_stats),
            config,
            left: Cell::new(0),
            right: Cell::new(capacity),
        })
    }

    /// Creates a new double stack allocator with default configuration
    pub fn new(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, StackConfig::default())
    }

    /// Creates a production-optimized double stack allocator
    pub fn production(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, StackConfig::production())
    }

    /// Creates a debug-optimized double stack allocator
    pub fn debug(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, StackConfig::debug())
    }

    /// Creates a performance-optimized double stack allocator
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

    /// Bytes in use on one side
    pub fn used(&self, side: Side) -> usize {
        match side {
            Side::Left => self.left.get(),
            Side::Right => self.capacity() - self.right.get(),
        }
    }

    /// Bytes in use on both sides
    pub fn used_total(&self) -> usize {
        self.left.get() + (self.capacity() - self.right.get())
    }

    /// Bytes left between the two cursors
    #[inline]
    pub fn available(&self) -> usize {
        self.right.get() - self.left.get()
    }

    /// Checks if one side holds no allocation
    pub fn is_empty(&self, side: Side) -> bool {
        self.used(side) == 0
    }

    /// Checks if neither side holds an allocation
    pub fn is_empty_both(&self) -> bool {
        self.is_empty(Side::Left) && self.is_empty(Side::Right)
    }

    /// Checks if a pointer lies inside this allocator's buffer
    pub fn contains<T>(&self, ptr: *const T) -> bool {
        self.memory.contains(ptr as usize)
    }

    /// Allocates `n_bytes` on `side`
    ///
    /// LEFT fails when `left + n_bytes > right`; RIGHT fails when
    /// `n_bytes > right` or `right - n_bytes < left`. A failed request
    /// changes no state.
    pub fn alloc(&self, side: Side, n_bytes: usize) -> Option<NonNull<u8>> {
        let (left, right) = (self.left.get(), self.right.get());
        let start = match side {
            Side::Left => left.checked_add(n_bytes).filter(|&end| end <= right).map(|_| left),
            Side::Right => right.checked_sub(n_bytes).filter(|&start| start >= left),
        };

        match start {
            // SAFETY: start and start + n_bytes both lie in [left, right].
            Some(start) => Some(unsafe { self.bump(side, start, n_bytes) }),
            None => {
                self.record_failure(side, n_bytes);
                None
            },
        }
    }

    /// Allocates `n_bytes` on `side`, aligned to `align`
    ///
    /// Reserves `n_bytes + align` bytes with the shift-byte layout used by
    /// [`StackAllocator::alloc_aligned`](crate::allocator::StackAllocator::alloc_aligned).
    pub fn alloc_aligned(&self, side: Side, n_bytes: usize, align: Align) -> Option<NonNull<u8>> {
        let Some(total) = n_bytes.checked_add(align.get()) else {
            self.record_failure(side, n_bytes);
            return None;
        };
        let raw = self.alloc(side, total)?;
        // SAFETY: `raw` is valid for `total >= align` bytes.
        Some(unsafe { align::align_ptr_store(raw, align) })
    }

    /// Recovers the raw start of a block returned by
    /// [`alloc_aligned`](Self::alloc_aligned)
    ///
    /// # Safety
    /// Same contract as
    /// [`StackAllocator::aligned_base`](crate::allocator::StackAllocator::aligned_base).
    pub unsafe fn aligned_base(&self, aligned: *mut u8) -> *mut u8 {
        match NonNull::new(aligned) {
            // SAFETY: caller contract.
            Some(aligned) => unsafe { align::unalign_ptr(aligned).as_ptr() },
            None => core::ptr::null_mut(),
        }
    }

    /// Captures the cursor of `side`
    pub fn marker(&self, side: Side) -> DoubleStackMarker {
        let index = match side {
            Side::Left => self.left.get(),
            Side::Right => self.right.get(),
        };
        DoubleStackMarker { side, index }
    }

    /// Validates a marker against its side's cursor without rewinding
    pub fn check_marker(&self, marker: DoubleStackMarker) -> MemoryResult<()> {
        let valid = match marker.side {
            Side::Left => marker.index <= self.left.get(),
            Side::Right => marker.index >= self.right.get() && marker.index <= self.capacity(),
        };
        if valid {
            Ok(())
        } else {
            let current = self.marker(marker.side).index;
            Err(MemoryError::invalid_side_marker(marker.side, marker.index, current))
        }
    }

    /// Rewinds the marker's side, releasing everything allocated on that
    /// side after it
    ///
    /// The other side is untouched. Fails with
    /// [`MemoryError::InvalidSideMarker`] if the side already rewound past
    /// the marker.
    ///
    /// # Safety
    /// No object allocated on that side after `marker` may be accessed
    /// afterwards.
    pub unsafe fn free_to_marker(&self, marker: DoubleStackMarker) -> MemoryResult<()> {
        self.check_marker(marker)?;

        let (start, len) = match marker.side {
            Side::Left => {
                let left = self.left.replace(marker.index);
                (marker.index, left - marker.index)
            },
            Side::Right => {
                let right = self.right.replace(marker.index);
                (right, marker.index - right)
            },
        };
        // SAFETY: the range lies inside the buffer and was just released.
        unsafe { self.scrub(start, len) };
        self.stats.record_dealloc();

        #[cfg(feature = "logging")]
        trace!(%marker, released = len, "double stack side rewound");

        Ok(())
    }

    /// Empties one side
    ///
    /// # Safety
    /// No object allocated on `side` may be accessed afterwards.
    pub unsafe fn clear(&self, side: Side) {
        let capacity = self.capacity();
        let (start, len) = match side {
            Side::Left => (0, self.left.replace(0)),
            Side::Right => {
                let right = self.right.replace(capacity);
                (right, capacity - right)
            },
        };
        // SAFETY: the range lies inside the buffer and was just released.
        unsafe { self.scrub(start, len) };
        self.stats.record_dealloc();
    }

    /// Empties both sides
    ///
    /// # Safety
    /// No object allocated from this allocator may be accessed afterwards.
    pub unsafe fn clear_all(&self) {
        // SAFETY: forwarded caller contract.
        unsafe {
            self.clear(Side::Left);
            self.clear(Side::Right);
        }
    }

    /// Places a `T` built by `init` on `side` at its natural alignment
    ///
    /// `init` runs only once the memory is reserved.
    pub fn new_with<T, F>(&self, side: Side, init: F) -> Option<NonNull<T>>
    where
        F: FnOnce() -> T,
    {
        let ptr = self.alloc_layout(side, Layout::new::<T>())?.cast::<T>();
        // SAFETY: the block is fresh, sized and aligned for T.
        unsafe { ptr.as_ptr().write(init()) };
        Some(ptr)
    }

    /// Places a `T` built by `init` on `side` at `align`
    ///
    /// The effective alignment is never lower than `T`'s own. Returns
    /// `Ok(None)` when the sides would overlap.
    ///
    /// # Errors
    /// [`MemoryError::InvalidAlignment`] if `T` is aligned beyond
    /// [`MAX_ALIGN`](crate::MAX_ALIGN).
    pub fn new_aligned_with<T, F>(
        &self,
        side: Side,
        align: Align,
        init: F,
    ) -> MemoryResult<Option<NonNull<T>>>
    where
        F: FnOnce() -> T,
    {
        let align = align.at_least_of::<T>()?;
        let Some(ptr) = self.alloc_aligned(side, size_of::<T>(), align) else {
            return Ok(None);
        };
        let ptr = ptr.cast::<T>();
        // SAFETY: alloc_aligned leaves size_of::<T>() usable bytes aligned to
        // at least align_of::<T>().
        unsafe { ptr.as_ptr().write(init()) };
        Ok(Some(ptr))
    }

    /// Reserves a block for `layout` on `side`
    ///
    /// The LEFT cursor is padded up to the alignment; the RIGHT block is
    /// placed at the highest aligned offset that fits below `right`.
    fn alloc_layout(&self, side: Side, layout: Layout) -> Option<NonNull<u8>> {
        let (left, right) = (self.left.get(), self.right.get());
        let base = self.memory.start_addr();

        let start = match side {
            Side::Left => {
                let addr = base + left;
                let start = left + (align_up(addr, layout.align()) - addr);
                start
                    .checked_add(layout.size())
                    .filter(|&end| end <= right)
                    .map(|_| start)
            },
            Side::Right => right
                .checked_sub(layout.size())
                .map(|offset| align_down(base + offset, layout.align()))
                .filter(|&addr| addr >= base + left)
                .map(|addr| addr - base),
        };

        match start {
            // SAFETY: the block [start, start + size) lies in [left, right].
            Some(start) => Some(unsafe { self.bump(side, start, layout.size()) }),
            None => {
                self.record_failure(side, layout.size());
                None
            },
        }
    }

    /// Bytes a typed request of `layout` on `side` would consume
    pub(crate) fn layout_cost(&self, side: Side, layout: Layout) -> usize {
        let base = self.memory.start_addr();
        match side {
            Side::Left => {
                let addr = base + self.left.get();
                (align_up(addr, layout.align()) - addr).saturating_add(layout.size())
            },
            Side::Right => {
                let addr = base + self.right.get();
                let padding = addr.wrapping_sub(layout.size()) & (layout.align() - 1);
                layout.size().saturating_add(padding)
            },
        }
    }

    /// Claims `[start, start + len)` for `side`
    ///
    /// # Safety
    /// The range must lie between the two cursors, touching the cursor of
    /// `side`.
    unsafe fn bump(&self, side: Side, start: usize, len: usize) -> NonNull<u8> {
        if let Some(pattern) = self.config.alloc_pattern {
            // SAFETY: the range is inside the buffer and not yet handed out.
            unsafe { self.memory.fill(start, len, pattern) };
        }
        match side {
            Side::Left => self.left.set(start + len),
            Side::Right => self.right.set(start),
        }
        self.stats.record_alloc(self.used_total());
        // SAFETY: start <= capacity.
        unsafe { self.memory.ptr_at(start) }
    }

    /// Writes the dealloc pattern over a released range
    ///
    /// # Safety
    /// The range must lie inside the buffer and hold no live object.
    unsafe fn scrub(&self, start: usize, len: usize) {
        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: caller contract.
            unsafe { self.memory.fill(start, len, pattern) };
        }
    }

    #[inline]
    fn record_failure(&self, side: Side, requested: usize) {
        self.stats.record_failure();

        #[cfg(feature = "logging")]
        trace!(
            %side,
            requested,
            left = self.left.get(),
            right = self.right.get(),
            "double stack allocation failed"
        );
        #[cfg(not(feature = "logging"))]
        let _ = (side, requested);
    }
}

impl fmt::Debug for DoubleStackAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoubleStackAllocator")
            .field("capacity", &self.capacity())
            .field("left", &self.left.get())
            .field("right", &self.right.get())
            .field("config", &self.config)
            .finish()
    }
}

impl MemoryUsage for DoubleStackAllocator {
    fn used_memory(&self) -> usize {
        self.used_total()
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.available())
    }
}

impl Resettable for DoubleStackAllocator {
    unsafe fn reset(&self) {
        // SAFETY: forwarded caller contract.
        unsafe { self.clear_all() }
    }
}

impl StatisticsProvider for DoubleStackAllocator {
    fn statistics(&self) -> AllocatorStats {
        self.stats.snapshot(self.used_total())
    }

    fn reset_statistics(&self) {
        self.stats.reset();
    }

    fn statistics_enabled(&self) -> bool {
        self.stats.enabled()
    }
}
