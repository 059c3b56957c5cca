//! Double stack allocator
//!
//! Two stacks sharing one buffer: the LEFT side grows up from the start,
//! the RIGHT side grows down from the end. Each side is released in LIFO
//! order through its own markers, and the sides never overlap.

pub mod allocator;
pub mod marker;
pub mod ptr;

pub use allocator::DoubleStackAllocator;
pub use marker::{DoubleStackMarker, Side};
pub use ptr::{DoubleStackPtr, DoubleStackPtrData, delete_ptr, new_ptr, new_ptr_aligned};
