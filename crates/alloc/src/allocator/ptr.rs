//! Typed handle to an object living in one of the allocators
//!
//! A [`Ptr`] pairs the object address with allocator-specific release data
//! `D` (the marker to rewind to, or the owning pool). Handles are created
//! by the `new_ptr` factories of each allocator module and consumed by the
//! matching `delete_ptr`:
//!
//! ```text
//! Unborn --new_ptr--> Live --delete_ptr--> Released
//! ```
//!
//! Dropping a live handle does not release anything. The object stays in
//! the allocator until its memory is reclaimed by a rewind, a clear or an
//! explicit free.

use core::fmt;
use core::ops::{Deref, DerefMut};
use core::ptr::{self, NonNull};

#[cfg(feature = "logging")]
use tracing::debug;

use crate::error::{MemoryError, MemoryResult};

/// Lifecycle state of a [`Ptr`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PtrState {
    /// Default-constructed, never pointed at anything
    Unborn,
    /// Points at a constructed object
    Live,
    /// The object was destroyed and its memory handed back
    Released,
}

impl fmt::Display for PtrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unborn => "unborn",
            Self::Live => "live",
            Self::Released => "released",
        })
    }
}

/// Typed handle carrying allocator-specific release data
pub struct Ptr<T, D> {
    ptr: Option<NonNull<T>>,
    data: Option<D>,
    state: PtrState,
}

impl<T, D> Ptr<T, D> {
    /// Creates a handle that points at nothing
    pub const fn unborn() -> Self {
        Self {
            ptr: None,
            data: None,
            state: PtrState::Unborn,
        }
    }

    pub(crate) fn live(ptr: NonNull<T>, data: D) -> Self {
        Self {
            ptr: Some(ptr),
            data: Some(data),
            state: PtrState::Live,
        }
    }

    /// Current lifecycle state
    #[inline]
    pub fn state(&self) -> PtrState {
        self.state
    }

    /// Checks if the handle points at a constructed object
    #[inline]
    pub fn is_live(&self) -> bool {
        self.state == PtrState::Live
    }

    /// Raw address of the object, or null unless live
    #[inline]
    pub fn as_ptr(&self) -> *mut T {
        self.ptr.map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    /// Release data captured at creation
    ///
    /// Kept after release so callers can still inspect where the handle came
    /// from.
    pub fn data(&self) -> Option<&D> {
        self.data.as_ref()
    }

    /// Shared access to the object
    pub fn try_get(&self) -> MemoryResult<&T> {
        match self.ptr {
            // SAFETY: a live handle points at a constructed T whose memory
            // stays reserved until `delete_ptr` or an unsafe rewind.
            Some(ptr) if self.is_live() => Ok(unsafe { ptr.as_ref() }),
            _ => Err(MemoryError::handle_not_live(self.state)),
        }
    }

    /// Exclusive access to the object
    pub fn try_get_mut(&mut self) -> MemoryResult<&mut T> {
        match self.ptr {
            // SAFETY: as in `try_get`; `&mut self` makes the access unique
            // since handles are not cloneable.
            Some(mut ptr) if self.is_live() => Ok(unsafe { ptr.as_mut() }),
            _ => Err(MemoryError::handle_not_live(self.state)),
        }
    }

    /// Address and release data of a live handle
    pub(crate) fn live_parts(&self) -> MemoryResult<(NonNull<T>, D)>
    where
        D: Copy,
    {
        match (self.ptr, self.data) {
            (Some(ptr), Some(data)) if self.is_live() => Ok((ptr, data)),
            _ => Err(MemoryError::handle_not_live(self.state)),
        }
    }

    pub(crate) fn mark_released(&mut self) {
        self.ptr = None;
        self.state = PtrState::Released;
    }
}

impl<T, D> Default for Ptr<T, D> {
    fn default() -> Self {
        Self::unborn()
    }
}

impl<T, D> Deref for Ptr<T, D> {
    type Target = T;

    /// # Panics
    /// If the handle is not live.
    fn deref(&self) -> &T {
        match self.try_get() {
            Ok(value) => value,
            Err(error) => panic!("cannot dereference handle: {error}"),
        }
    }
}

impl<T, D> DerefMut for Ptr<T, D> {
    /// # Panics
    /// If the handle is not live.
    fn deref_mut(&mut self) -> &mut T {
        match self.try_get_mut() {
            Ok(value) => value,
            Err(error) => panic!("cannot dereference handle: {error}"),
        }
    }
}

impl<T, D> PartialEq for Ptr<T, D> {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state && self.as_ptr() == other.as_ptr()
    }
}

impl<T, D> Eq for Ptr<T, D> {}

impl<T, D> fmt::Debug for Ptr<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ptr")
            .field("state", &self.state)
            .field("ptr", &self.as_ptr())
            .finish()
    }
}

impl<T, D> Drop for Ptr<T, D> {
    fn drop(&mut self) {
        if self.is_live() {
            #[cfg(feature = "logging")]
            debug!(
                ptr = ?self.as_ptr(),
                type_name = core::any::type_name::<T>(),
                "live handle dropped without delete_ptr; object stays until its memory is reclaimed"
            );
        }
    }
}
