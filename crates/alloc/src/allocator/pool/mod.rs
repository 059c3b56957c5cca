//! Pool allocator
//!
//! Fixed-size slots for one element type with O(1) allocation and release.
//! Free slots form a LIFO list kept in a side table of slot states, so a
//! released pointer can be checked for ownership and double frees.

pub mod allocator;
pub mod config;
pub mod ptr;
pub mod stats;

pub use allocator::PoolAllocator;
pub use config::PoolConfig;
pub use ptr::{PoolPtr, PoolPtrData, delete_ptr, new_ptr};
pub use stats::PoolStats;
