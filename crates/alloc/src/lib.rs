//! # nebula-alloc
//!
//! Fixed-capacity custom allocators for workloads that need predictable,
//! allocation-free hot paths:
//!
//! - [`StackAllocator`](allocator::StackAllocator) - bump allocation with
//!   LIFO release through markers
//! - [`DoubleStackAllocator`](allocator::DoubleStackAllocator) - two stacks
//!   sharing one buffer from both ends
//! - [`PoolAllocator`](allocator::PoolAllocator) - fixed-size slots for one
//!   element type with O(1) allocation and release
//!
//! Each allocator reserves its buffer once at construction and never grows.
//! Raw entry points return `Option<NonNull<_>>`; the typed `new_ptr` /
//! `delete_ptr` factories return [`MemoryResult`] and hand out
//! [`Ptr`](allocator::Ptr) handles that borrow their allocator.
//!
//! ## Quick Start
//!
//! ```rust
//! use nebula_alloc::prelude::*;
//!
//! # fn main() -> nebula_alloc::Result<()> {
//! let allocator = StackAllocator::new(1024)?;
//!
//! let mut point = stack::new_ptr(&allocator, || (1.0_f32, 2.0_f32))?;
//! point.0 += 1.0;
//! assert_eq!(*point, (2.0, 2.0));
//!
//! // SAFETY: nothing allocated after `point` is used again.
//! unsafe { stack::delete_ptr(&mut point)? };
//! assert!(allocator.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `logging` (default): construction, failure and misuse events through
//!   `tracing`
//!
//! ## Thread Safety
//!
//! Allocators are `Send` but not `Sync`. Cursors live in `Cell`s so
//! allocation works through `&self`, which lets handles borrow the
//! allocator they came from.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(unsafe_code)]

pub mod align;
pub mod allocator;
pub mod core;
pub mod error;

pub use align::{Align, MAX_ALIGN};
pub use error::{MemoryError, MemoryResult, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::align::Align;
    pub use crate::allocator::{
        AllocatorStats, DoubleStackAllocator, DoubleStackMarker, MemoryUsage, PoolAllocator,
        PoolConfig, Ptr, PtrState, Resettable, Side, StackAllocator, StackConfig, StackFrame,
        StackMarker, StatisticsProvider,
    };
    pub use crate::allocator::{double_stack, pool, stack};
    pub use crate::error::{MemoryError, MemoryResult};
}
