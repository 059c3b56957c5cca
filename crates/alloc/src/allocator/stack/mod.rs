//! Stack allocator
//!
//! A linear bump allocator over one owned buffer with LIFO release through
//! markers.
//!
//! ## Modules
//! - `allocator` - Main `StackAllocator` implementation
//! - `config` - Configuration variants (production, debug, performance)
//! - `frame` - RAII helper for automatic stack restoration
//! - `marker` - Position markers for scoped deallocation
//! - `ptr` - Typed handle factories (`new_ptr` / `delete_ptr`)

pub mod allocator;
pub mod config;
pub mod frame;
pub mod marker;
pub mod ptr;

pub use allocator::StackAllocator;
pub use config::StackConfig;
pub use frame::StackFrame;
pub use marker::StackMarker;
pub use ptr::{StackPtr, StackPtrData, delete_ptr, new_ptr, new_ptr_aligned};
