//! Typed handles over a [`DoubleStackAllocator`]

use core::alloc::Layout;
use core::ptr;

use super::{DoubleStackAllocator, DoubleStackMarker, Side};
use crate::align::Align;
use crate::allocator::ptr::Ptr;
use crate::error::{MemoryError, MemoryResult};

/// Release data of a double stack handle: side and cursor captured before
/// allocation
pub struct DoubleStackPtrData<'a> {
    marker: DoubleStackMarker,
    allocator: &'a DoubleStackAllocator,
}

impl<'a> DoubleStackPtrData<'a> {
    /// Marker the handle's side rewinds to on delete
    pub fn marker(&self) -> DoubleStackMarker {
        self.marker
    }

    /// Side the object lives on
    pub fn side(&self) -> Side {
        self.marker.side()
    }

    /// Allocator that owns the object
    pub fn allocator(&self) -> &'a DoubleStackAllocator {
        self.allocator
    }
}

impl Clone for DoubleStackPtrData<'_> {
    fn clone(&self) -> Self {
        *self
    }
}

impl Copy for DoubleStackPtrData<'_> {}

/// Handle to a `T` living on one side of a [`DoubleStackAllocator`]
pub type DoubleStackPtr<'a, T> = Ptr<T, DoubleStackPtrData<'a>>;

fn overlap(allocator: &DoubleStackAllocator, side: Side, requested: usize) -> MemoryError {
    let left = allocator.marker(Side::Left).index();
    let right = allocator.marker(Side::Right).index();
    MemoryError::double_stack_overlap(side, allocator.capacity(), left, right, requested)
}

/// Constructs a `T` on `side`
///
/// # Errors
/// [`MemoryError::DoubleStackOverlap`] if the object would cross the other
/// side's cursor.
pub fn new_ptr<'a, T, F>(
    allocator: &'a DoubleStackAllocator,
    side: Side,
    init: F,
) -> MemoryResult<DoubleStackPtr<'a, T>>
where
    F: FnOnce() -> T,
{
    let marker = allocator.marker(side);
    let requested = allocator.layout_cost(side, Layout::new::<T>());
    let ptr = allocator
        .new_with(side, init)
        .ok_or_else(|| overlap(allocator, side, requested))?;
    Ok(Ptr::live(ptr, DoubleStackPtrData { marker, allocator }))
}

/// Constructs a `T` on `side` at `align`
///
/// # Errors
/// [`MemoryError::DoubleStackOverlap`] if the object plus its alignment
/// slack would cross the other side's cursor,
/// [`MemoryError::InvalidAlignment`] if `T` is aligned beyond
/// [`MAX_ALIGN`](crate::MAX_ALIGN).
pub fn new_ptr_aligned<'a, T, F>(
    allocator: &'a DoubleStackAllocator,
    side: Side,
    align: Align,
    init: F,
) -> MemoryResult<DoubleStackPtr<'a, T>>
where
    F: FnOnce() -> T,
{
    let align = align.at_least_of::<T>()?;
    let marker = allocator.marker(side);
    let ptr = allocator.new_aligned_with(side, align, init)?.ok_or_else(|| {
        overlap(allocator, side, size_of::<T>().saturating_add(align.get()))
    })?;
    Ok(Ptr::live(ptr, DoubleStackPtrData { marker, allocator }))
}

/// Destroys the object and rewinds its side to the handle's marker
///
/// Out-of-order releases fail before the object is dropped, leaving the
/// handle live.
///
/// # Errors
/// [`MemoryError::HandleNotLive`] for unborn or released handles,
/// [`MemoryError::InvalidSideMarker`] when the side already rewound past
/// the handle.
///
/// # Safety
/// No object created later on the same side may be accessed afterwards.
pub unsafe fn delete_ptr<T>(handle: &mut DoubleStackPtr<'_, T>) -> MemoryResult<()> {
    let (ptr, data) = handle.live_parts()?;
    data.allocator.check_marker(data.marker)?;

    // SAFETY: the handle is live, so the object is constructed and owned by
    // this handle alone.
    unsafe { ptr::drop_in_place(ptr.as_ptr()) };
    // SAFETY: forwarded caller contract; the marker was validated above.
    unsafe { data.allocator.free_to_marker(data.marker)? };

    handle.mark_released();
    Ok(())
}
