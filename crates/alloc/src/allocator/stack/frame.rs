//! RAII-based stack frame for automatic restoration

#[cfg(feature = "logging")]
use tracing::debug;

use super::{StackAllocator, StackMarker};

/// RAII helper for stack-based scoped allocation
///
/// Captures a marker on creation and rewinds the allocator to it when
/// dropped, releasing everything allocated inside the frame.
pub struct StackFrame<'a> {
    allocator: &'a StackAllocator,
    marker: StackMarker,
}

impl<'a> StackFrame<'a> {
    /// Creates a new stack frame that will restore to the current position
    /// when dropped
    ///
    /// # Safety
    /// Nothing allocated after this call may be accessed once the frame is
    /// dropped.
    pub unsafe fn new(allocator: &'a StackAllocator) -> Self {
        Self {
            marker: allocator.marker(),
            allocator,
        }
    }

    /// Gets the underlying allocator
    pub fn allocator(&self) -> &'a StackAllocator {
        self.allocator
    }

    /// Marker the frame restores to
    pub fn marker(&self) -> StackMarker {
        self.marker
    }

    /// Manually restore and consume this frame
    pub fn restore(self) {
        drop(self);
    }
}

impl Drop for StackFrame<'_> {
    fn drop(&mut self) {
        // An outer rewind already released the frame.
        if self.marker.position() > self.allocator.used() {
            #[cfg(feature = "logging")]
            debug!(marker = %self.marker, "stack frame already released");
            return;
        }
        // SAFETY: upheld by the contract of `StackFrame::new`; the marker
        // was checked against the top above.
        let _ = unsafe { self.allocator.free_to_marker(self.marker) };
    }
}
