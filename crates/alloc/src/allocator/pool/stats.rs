//! Pool allocator statistics

use core::fmt;

/// Snapshot of a pool's slot usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Total allocations performed (0 unless tracking is enabled)
    pub total_allocs: usize,
    /// Total releases performed (0 unless tracking is enabled)
    pub total_deallocs: usize,
    /// Peak number of slots in use, in bytes of stride
    pub peak_usage: usize,
    /// Current memory usage in bytes of stride
    pub current_usage: usize,
    /// Distance between consecutive slots
    pub block_size: usize,
    /// Total number of slots
    pub block_count: usize,
    /// Currently free slots
    pub free_blocks: usize,
}

impl PoolStats {
    /// Slots currently handed out
    pub fn used_blocks(&self) -> usize {
        self.block_count - self.free_blocks
    }

    /// Fraction of slots in use (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        if self.block_count == 0 {
            0.0
        } else {
            self.used_blocks() as f64 / self.block_count as f64
        }
    }
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pool: {}/{} blocks in use ({} bytes each), peak {} bytes",
            self.used_blocks(),
            self.block_count,
            self.block_size,
            self.peak_usage
        )
    }
}
