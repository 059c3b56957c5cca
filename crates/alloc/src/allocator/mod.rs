//! Allocators and the typed handle shared by them
//!
//! - [`stack`] - single LIFO stack with markers and frames
//! - [`double_stack`] - two stacks growing toward each other
//! - [`pool`] - fixed-size slots with a checked free list
//! - [`ptr`] - [`Ptr`] handles produced by each module's `new_ptr`

pub mod double_stack;
pub mod pool;
pub mod ptr;
pub mod stack;

pub use double_stack::{DoubleStackAllocator, DoubleStackMarker, DoubleStackPtr, Side};
pub use pool::{PoolAllocator, PoolConfig, PoolPtr, PoolStats};
pub use ptr::{Ptr, PtrState};
pub use stack::{StackAllocator, StackConfig, StackFrame, StackMarker, StackPtr};

pub use crate::core::{AllocatorStats, MemoryUsage, Resettable, StatisticsProvider};
