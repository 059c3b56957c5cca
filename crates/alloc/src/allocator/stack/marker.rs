//! Stack marker for position tracking

use core::fmt;

/// Marker representing a position in the stack allocator
///
/// Can be used to reset the allocator to this position, deallocating
/// all allocations made after the marker was created. Markers order by
/// position, so a marker taken earlier never compares greater than one
/// taken later without an intervening rewind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StackMarker {
    pub(super) position: usize,
}

impl StackMarker {
    /// Sentinel that never denotes a real position
    ///
    /// Stack sizes equal to this value are rejected at construction, so
    /// rewinding to it always fails.
    pub const INVALID: Self = Self {
        position: usize::MAX,
    };

    /// Cursor offset captured by this marker
    #[inline]
    pub const fn position(self) -> usize {
        self.position
    }

    /// Checks if this is the [`INVALID`](Self::INVALID) sentinel
    #[inline]
    pub const fn is_invalid(self) -> bool {
        self.position == usize::MAX
    }
}

impl Default for StackMarker {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for StackMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_invalid() {
            f.write_str("<invalid>")
        } else {
            write!(f, "@{}", self.position)
        }
    }
}
