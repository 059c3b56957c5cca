//! Typed handles over a [`PoolAllocator`]

use super::PoolAllocator;
use crate::allocator::ptr::Ptr;
use crate::error::{MemoryError, MemoryResult};

/// Release data of a pool handle: the owning pool
pub struct PoolPtrData<'a, T> {
    allocator: &'a PoolAllocator<T>,
}

impl<'a, T> PoolPtrData<'a, T> {
    /// Pool that owns the object
    pub fn allocator(&self) -> &'a PoolAllocator<T> {
        self.allocator
    }
}

impl<T> Clone for PoolPtrData<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PoolPtrData<'_, T> {}

/// Handle to a `T` living in a [`PoolAllocator`]
pub type PoolPtr<'a, T> = Ptr<T, PoolPtrData<'a, T>>;

/// Constructs a `T` in a free slot
///
/// # Errors
/// [`MemoryError::PoolExhausted`] if every slot is in use. `init` is not
/// called in that case.
pub fn new_ptr<'a, T, F>(allocator: &'a PoolAllocator<T>, init: F) -> MemoryResult<PoolPtr<'a, T>>
where
    F: FnOnce() -> T,
{
    let ptr = allocator
        .new_with(init)
        .ok_or_else(|| MemoryError::pool_exhausted(allocator.capacity(), allocator.free_count()))?;
    Ok(Ptr::live(ptr, PoolPtrData { allocator }))
}

/// Destroys the object and returns its slot to the pool
///
/// Pool slots are independent, so unlike the stack variants this is safe:
/// a live handle is the sole owner of its slot.
///
/// # Errors
/// [`MemoryError::HandleNotLive`] for unborn or released handles.
pub fn delete_ptr<T>(handle: &mut PoolPtr<'_, T>) -> MemoryResult<()> {
    let (ptr, data) = handle.live_parts()?;
    // SAFETY: the live handle owns an initialized T in one of the pool's
    // slots and is marked released right after, so it is never read again.
    unsafe { data.allocator.delete(ptr.as_ptr())? };
    handle.mark_released();
    Ok(())
}
