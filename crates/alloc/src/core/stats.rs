//! Allocation statistics

use core::cell::Cell;
use core::fmt;

/// Statistics for memory allocators
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Total bytes currently allocated
    pub allocated_bytes: usize,
    /// Peak bytes allocated
    pub peak_allocated_bytes: usize,
    /// Total number of allocations
    pub allocation_count: usize,
    /// Total number of deallocations (frees, rewinds and clears)
    pub deallocation_count: usize,
    /// Number of failed allocations
    pub failed_allocations: usize,
}

impl AllocatorStats {
    /// Creates a new empty stats object
    pub const fn new() -> Self {
        Self {
            allocated_bytes: 0,
            peak_allocated_bytes: 0,
            allocation_count: 0,
            deallocation_count: 0,
            failed_allocations: 0,
        }
    }

    /// Calculate current allocation efficiency (0.0 to 1.0)
    ///
    /// Higher values indicate fewer failed allocations.
    pub fn allocation_efficiency(&self) -> f64 {
        let total_attempts = self.allocation_count + self.failed_allocations;
        if total_attempts > 0 {
            self.allocation_count as f64 / total_attempts as f64
        } else {
            1.0
        }
    }

    /// Check if there are any active allocations
    pub fn has_active_allocations(&self) -> bool {
        self.allocated_bytes > 0
    }
}

impl fmt::Display for AllocatorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Allocator Statistics:")?;
        writeln!(f, "  Current allocated: {} bytes", self.allocated_bytes)?;
        writeln!(f, "  Peak allocated: {} bytes", self.peak_allocated_bytes)?;
        writeln!(f, "  Allocations: {}", self.allocation_count)?;
        writeln!(f, "  Deallocations: {}", self.deallocation_count)?;
        write!(f, "  Failed allocations: {}", self.failed_allocations)
    }
}

/// Single-threaded counters backing [`AllocatorStats`]
///
/// Every recording method is a no-op unless tracking was enabled at
/// construction, so untracked allocators pay one branch per operation.
#[derive(Debug, Default)]
pub(crate) struct StatsCounter {
    enabled: bool,
    allocs: Cell<usize>,
    deallocs: Cell<usize>,
    failures: Cell<usize>,
    peak: Cell<usize>,
}

impl StatsCounter {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    #[inline]
    pub(crate) fn enabled(&self) -> bool {
        self.enabled
    }

    /// Records a successful allocation leaving `used` bytes in use
    #[inline]
    pub(crate) fn record_alloc(&self, used: usize) {
        if self.enabled {
            self.allocs.set(self.allocs.get() + 1);
            if used > self.peak.get() {
                self.peak.set(used);
            }
        }
    }

    #[inline]
    pub(crate) fn record_dealloc(&self) {
        if self.enabled {
            self.deallocs.set(self.deallocs.get() + 1);
        }
    }

    #[inline]
    pub(crate) fn record_failure(&self) {
        if self.enabled {
            self.failures.set(self.failures.get() + 1);
        }
    }

    pub(crate) fn reset(&self) {
        self.allocs.set(0);
        self.deallocs.set(0);
        self.failures.set(0);
        self.peak.set(0);
    }

    /// Builds a snapshot given the allocator's current usage
    pub(crate) fn snapshot(&self, allocated_bytes: usize) -> AllocatorStats {
        AllocatorStats {
            allocated_bytes,
            peak_allocated_bytes: if self.enabled {
                self.peak.get().max(allocated_bytes)
            } else {
                allocated_bytes
            },
            allocation_count: self.allocs.get(),
            deallocation_count: self.deallocs.get(),
            failed_allocations: self.failures.get(),
        }
    }
}
