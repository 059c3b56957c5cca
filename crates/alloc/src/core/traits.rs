//! Capability traits implemented by the allocators

use super::stats::AllocatorStats;

/// Memory usage reporting
pub trait MemoryUsage {
    /// Get currently used memory in bytes
    fn used_memory(&self) -> usize;

    /// Get available memory in bytes (if known)
    fn available_memory(&self) -> Option<usize>;

    /// Get total memory capacity in bytes (if known)
    fn total_memory(&self) -> Option<usize> {
        self.available_memory()
            .map(|available| self.used_memory() + available)
    }

    /// Returns memory usage as a percentage (0.0 to 100.0)
    ///
    /// Returns `None` if total memory is unknown.
    fn memory_usage_percent(&self) -> Option<f32> {
        self.total_memory().map(|total| {
            if total == 0 {
                0.0
            } else {
                (self.used_memory() as f32 / total as f32) * 100.0
            }
        })
    }
}

/// Allocators that can release everything at once
pub trait Resettable {
    /// Reset allocator to initial state
    ///
    /// # Safety
    /// - All pointers allocated before reset become invalid immediately
    /// - No destructors run; live objects are simply forgotten
    /// - Caller must ensure no live references exist before calling
    unsafe fn reset(&self);

    /// Check if this allocator can be reset
    fn can_reset(&self) -> bool {
        true
    }
}

/// Statistics reporting
pub trait StatisticsProvider {
    /// Get current statistics
    fn statistics(&self) -> AllocatorStats;

    /// Reset statistics
    fn reset_statistics(&self);

    /// Check if statistics collection is enabled
    fn statistics_enabled(&self) -> bool {
        true
    }
}
