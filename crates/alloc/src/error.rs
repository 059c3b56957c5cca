//! Standalone error types for nebula-alloc
//!
//! Uses thiserror for clean, idiomatic Rust error definitions.
//!
//! Only the typed tier reports through [`MemoryError`]. Raw allocation entry
//! points (`alloc`, `alloc_aligned`, pool `alloc`) signal exhaustion with
//! `None`, which callers are expected to check.

use thiserror::Error;

#[cfg(feature = "logging")]
use tracing::{debug, error, warn};

use crate::allocator::double_stack::Side;
use crate::allocator::ptr::PtrState;

// ============================================================================
// Main Error Types
// ============================================================================

/// Allocator errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    // --- Construction Errors ---
    #[error("Invalid size {size}: {reason}")]
    InvalidSize { size: usize, reason: String },

    #[error("Invalid alignment: {alignment} (must be a power of two no greater than {max})")]
    InvalidAlignment { alignment: usize, max: usize },

    #[error("Size overflow during operation: {operation}")]
    SizeOverflow { operation: String },

    // --- Capacity Errors ---
    #[error(
        "Cannot allocate memory for object in stack allocator: capacity {capacity}, used {used}, requested {requested}"
    )]
    StackExhausted {
        capacity: usize,
        used: usize,
        requested: usize,
    },

    #[error(
        "Cannot allocate memory in {side} stack, stacks would be overlapping: capacity {capacity}, left {left}, right {right}, requested {requested}"
    )]
    DoubleStackOverlap {
        side: Side,
        capacity: usize,
        left: usize,
        right: usize,
        requested: usize,
    },

    #[error("Pool exhausted: capacity {capacity}, free {free}")]
    PoolExhausted { capacity: usize, free: usize },

    // --- Release Errors ---
    #[error(
        "Invalid marker {marker} (current {current}): it may have been implicitly freed by rewinding to a lower marker"
    )]
    InvalidMarker { marker: usize, current: usize },

    #[error(
        "Invalid {side} marker {marker} (current {current}): it may have been implicitly freed by rewinding to a lower marker"
    )]
    InvalidSideMarker {
        side: Side,
        marker: usize,
        current: usize,
    },

    #[error("Invalid pointer: {reason}")]
    InvalidPointer { reason: String },

    #[error("Double free of pool slot {slot}")]
    DoubleFree { slot: usize },

    #[error("Handle is not live (state: {state})")]
    HandleNotLive { state: PtrState },
}

impl MemoryError {
    /// Check if error is retryable
    ///
    /// Only capacity conditions qualify: they go away once memory is
    /// released. Marker, pointer and handle errors are caller bugs.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StackExhausted { .. } | Self::DoubleStackOverlap { .. } | Self::PoolExhausted { .. }
        )
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidSize { .. } => "MEM:ALLOC:SIZE",
            Self::InvalidAlignment { .. } => "MEM:ALLOC:ALIGN",
            Self::SizeOverflow { .. } => "MEM:ALLOC:OVERFLOW",
            Self::StackExhausted { .. } => "MEM:STACK:EXHAUSTED",
            Self::DoubleStackOverlap { .. } => "MEM:STACK:OVERLAP",
            Self::PoolExhausted { .. } => "MEM:POOL:EXHAUSTED",
            Self::InvalidMarker { .. } | Self::InvalidSideMarker { .. } => "MEM:STACK:MARKER",
            Self::InvalidPointer { .. } => "MEM:POOL:POINTER",
            Self::DoubleFree { .. } => "MEM:POOL:DOUBLE_FREE",
            Self::HandleNotLive { .. } => "MEM:PTR:NOT_LIVE",
        }
    }

    // ============================================================================
    // Convenience Constructors - Construction Errors
    // ============================================================================

    /// Create invalid size error
    pub fn invalid_size(size: usize, reason: &str) -> Self {
        Self::InvalidSize {
            size,
            reason: reason.to_string(),
        }
    }

    /// Create invalid alignment error
    pub fn invalid_alignment(alignment: usize) -> Self {
        Self::InvalidAlignment {
            alignment,
            max: crate::align::MAX_ALIGN,
        }
    }

    /// Create size overflow error
    pub fn size_overflow(operation: &str) -> Self {
        Self::SizeOverflow {
            operation: operation.to_string(),
        }
    }

    // --- Capacity Errors ---

    /// Create stack exhausted error
    pub fn stack_exhausted(capacity: usize, used: usize, requested: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(capacity, used, requested, "stack allocator exhausted");

        Self::StackExhausted {
            capacity,
            used,
            requested,
        }
    }

    /// Create double stack overlap error
    pub fn double_stack_overlap(
        side: Side,
        capacity: usize,
        left: usize,
        right: usize,
        requested: usize,
    ) -> Self {
        #[cfg(feature = "logging")]
        warn!(%side, capacity, left, right, requested, "double stack sides would overlap");

        Self::DoubleStackOverlap {
            side,
            capacity,
            left,
            right,
            requested,
        }
    }

    /// Create pool exhausted error
    pub fn pool_exhausted(capacity: usize, free: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(capacity, free, "pool allocator exhausted");

        Self::PoolExhausted { capacity, free }
    }

    // --- Release Errors ---

    /// Create invalid marker error
    ///
    /// Logged at debug level: marker checks are also used as a predicate.
    pub fn invalid_marker(marker: usize, current: usize) -> Self {
        #[cfg(feature = "logging")]
        debug!(marker, current, "marker already released by a lower rewind");

        Self::InvalidMarker { marker, current }
    }

    /// Create invalid marker error for one side of a double stack
    pub fn invalid_side_marker(side: Side, marker: usize, current: usize) -> Self {
        #[cfg(feature = "logging")]
        debug!(%side, marker, current, "marker already released by a lower rewind");

        Self::InvalidSideMarker {
            side,
            marker,
            current,
        }
    }

    /// Create invalid pointer error
    pub fn invalid_pointer(reason: &str) -> Self {
        #[cfg(feature = "logging")]
        error!("invalid pointer released to pool: {reason}");

        Self::InvalidPointer {
            reason: reason.to_string(),
        }
    }

    /// Create double free error
    pub fn double_free(slot: usize) -> Self {
        #[cfg(feature = "logging")]
        error!(slot, "double free detected");

        Self::DoubleFree { slot }
    }

    /// Create handle not live error
    pub fn handle_not_live(state: PtrState) -> Self {
        Self::HandleNotLive { state }
    }

    /// Check if this is an invalid marker error
    #[must_use]
    pub fn is_invalid_marker(&self) -> bool {
        matches!(self, Self::InvalidMarker { .. } | Self::InvalidSideMarker { .. })
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result type for allocator operations
pub type MemoryResult<T> = core::result::Result<T, MemoryError>;

/// Generic result type alias
pub type Result<T> = MemoryResult<T>;

// ============================================================================
// Tests
// ============================================================================
