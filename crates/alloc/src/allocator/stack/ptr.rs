//! Typed handles over a [`StackAllocator`]

use core::alloc::Layout;
use core::ptr;

use super::{StackAllocator, StackMarker};
use crate::align::Align;
use crate::allocator::ptr::Ptr;
use crate::error::{MemoryError, MemoryResult};

/// Release data of a stack handle: the top captured before allocation
pub struct StackPtrData<'a> {
    marker: StackMarker,
    allocator: &'a StackAllocator,
}

impl<'a> StackPtrData<'a> {
    /// Marker the allocator rewinds to when the handle is deleted
    pub fn marker(&self) -> StackMarker {
        self.marker
    }

    /// Allocator that owns the object
    pub fn allocator(&self) -> &'a StackAllocator {
        self.allocator
    }
}

impl Clone for StackPtrData<'_> {
    fn clone(&self) -> Self {
        *self
    }
}

impl Copy for StackPtrData<'_> {}

/// Handle to a `T` living in a [`StackAllocator`]
pub type StackPtr<'a, T> = Ptr<T, StackPtrData<'a>>;

/// Constructs a `T` on top of the stack
///
/// `init` is only called once the memory is reserved. On exhaustion the
/// allocator is left unchanged.
///
/// # Errors
/// [`MemoryError::StackExhausted`] if the object does not fit.
pub fn new_ptr<'a, T, F>(allocator: &'a StackAllocator, init: F) -> MemoryResult<StackPtr<'a, T>>
where
    F: FnOnce() -> T,
{
    let marker = allocator.marker();
    let requested = allocator.layout_cost(Layout::new::<T>());
    let ptr = allocator.new_with(init).ok_or_else(|| {
        MemoryError::stack_exhausted(allocator.capacity(), allocator.used(), requested)
    })?;
    Ok(Ptr::live(ptr, StackPtrData { marker, allocator }))
}

/// Constructs a `T` on top of the stack at `align`
///
/// # Errors
/// [`MemoryError::StackExhausted`] if the object plus its alignment slack
/// does not fit, [`MemoryError::InvalidAlignment`] if `T` is aligned beyond
/// [`MAX_ALIGN`](crate::MAX_ALIGN).
pub fn new_ptr_aligned<'a, T, F>(
    allocator: &'a StackAllocator,
    align: Align,
    init: F,
) -> MemoryResult<StackPtr<'a, T>>
where
    F: FnOnce() -> T,
{
    let align = align.at_least_of::<T>()?;
    let marker = allocator.marker();
    let ptr = allocator.new_aligned_with(align, init)?.ok_or_else(|| {
        MemoryError::stack_exhausted(
            allocator.capacity(),
            allocator.used(),
            size_of::<T>().saturating_add(align.get()),
        )
    })?;
    Ok(Ptr::live(ptr, StackPtrData { marker, allocator }))
}

/// Destroys the object and rewinds the allocator to the handle's marker
///
/// The marker is checked before the object is dropped: releasing handles
/// out of LIFO order fails with [`MemoryError::InvalidMarker`] and leaves
/// the handle live and the object intact.
///
/// # Errors
/// [`MemoryError::HandleNotLive`] for unborn or released handles,
/// [`MemoryError::InvalidMarker`] when a lower rewind already released
/// the object's memory.
///
/// # Safety
/// Rewinding releases everything allocated after the handle, so no object
/// created later (through another handle or a raw allocation) may be
/// accessed afterwards.
pub unsafe fn delete_ptr<T>(handle: &mut StackPtr<'_, T>) -> MemoryResult<()> {
    let (ptr, data) = handle.live_parts()?;
    data.allocator.check_marker(data.marker)?;

    // SAFETY: the handle is live, so the object is constructed and owned by
    // this handle alone.
    unsafe { ptr::drop_in_place(ptr.as_ptr()) };
    // SAFETY: forwarded caller contract. The marker was validated above and
    // nothing ran in between.
    unsafe { data.allocator.free_to_marker(data.marker)? };

    handle.mark_released();
    Ok(())
}
