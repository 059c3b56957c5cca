//! Alignment utilities
//!
//! Address rounding plus the shift-byte trick shared by every allocator in
//! this crate. An aligned allocation reserves `n + align` raw bytes, moves the
//! returned pointer forward by 1..=`align` bytes and records that distance in
//! the byte immediately before the aligned address:
//!
//! ```text
//! raw                     aligned
//!  │                         │
//!  ▼                         ▼
//!  [ padding ... ][ shift ][ n usable bytes ............ ][ slack ]
//!  <----- shift bytes ------>
//! ```
//!
//! The shift is always in `1..=256` and is stored in a single byte, with the
//! value 256 encoded as `0`. That bound is why [`MAX_ALIGN`] is 256.

use core::fmt;
use core::ptr::NonNull;

use crate::error::{MemoryError, MemoryResult};

/// Largest supported alignment, limited by the one-byte shift encoding
pub const MAX_ALIGN: usize = 256;

/// Validated alignment: a power of two no greater than [`MAX_ALIGN`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Align(usize);

impl Align {
    /// Byte alignment (no padding beyond the shift byte)
    pub const ONE: Self = Self(1);

    /// Creates a new alignment, rejecting zero, non-powers of two and values
    /// above [`MAX_ALIGN`]
    pub fn new(bytes: usize) -> MemoryResult<Self> {
        if bytes.is_power_of_two() && bytes <= MAX_ALIGN {
            Ok(Self(bytes))
        } else {
            Err(MemoryError::invalid_alignment(bytes))
        }
    }

    /// Natural alignment of `T`
    pub fn of<T>() -> MemoryResult<Self> {
        Self::new(core::mem::align_of::<T>())
    }

    /// Raises `self` to at least the natural alignment of `T`
    ///
    /// Fails with [`MemoryError::InvalidAlignment`] when `T` is aligned
    /// beyond [`MAX_ALIGN`].
    pub fn at_least_of<T>(self) -> MemoryResult<Self> {
        Ok(self.max(Self::of::<T>()?))
    }

    /// Returns the alignment in bytes
    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl Default for Align {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Align {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Align> for usize {
    fn from(align: Align) -> Self {
        align.0
    }
}

impl TryFrom<usize> for Align {
    type Error = MemoryError;

    fn try_from(bytes: usize) -> MemoryResult<Self> {
        Self::new(bytes)
    }
}

/// Aligns a value up to the specified alignment
///
/// `alignment` must be a power of two.
#[inline(always)]
pub const fn align_up(value: usize, alignment: usize) -> usize {
    (value + alignment - 1) & !(alignment - 1)
}

/// Aligns a value down to the specified alignment
///
/// `alignment` must be a power of two.
#[inline(always)]
pub const fn align_down(value: usize, alignment: usize) -> usize {
    value & !(alignment - 1)
}

/// Checks if a value is aligned to the specified alignment
#[inline(always)]
pub const fn is_aligned(value: usize, alignment: usize) -> bool {
    value & (alignment - 1) == 0
}

/// Checks if a pointer is aligned to the specified alignment
#[inline(always)]
pub fn is_aligned_ptr<T>(ptr: *const T, alignment: usize) -> bool {
    is_aligned(ptr as usize, alignment)
}

/// Distance from `addr` to the aligned address [`align_ptr_store`] returns
///
/// Always in `1..=align`: an address that is already aligned is moved a full
/// `align` forward so the shift byte has somewhere to live.
#[inline]
pub const fn shift_for(addr: usize, align: Align) -> usize {
    let aligned = align_up(addr, align.get());
    if aligned == addr {
        align.get()
    } else {
        aligned - addr
    }
}

/// Encodes a shift in `1..=256` into one byte (256 becomes 0)
#[inline]
pub const fn encode_shift(shift: usize) -> u8 {
    debug_assert!(shift > 0 && shift <= MAX_ALIGN);
    (shift & 0xff) as u8
}

/// Decodes a stored shift byte (0 means 256)
#[inline]
pub const fn decode_shift(byte: u8) -> usize {
    if byte == 0 { MAX_ALIGN } else { byte as usize }
}

/// Aligns `raw` and stores the shift in the byte before the result
///
/// # Safety
/// `raw` must be valid for writes of `align` bytes. Callers reserve
/// `n + align` bytes so that `n` usable bytes follow the returned pointer.
#[inline]
pub unsafe fn align_ptr_store(raw: NonNull<u8>, align: Align) -> NonNull<u8> {
    let shift = shift_for(raw.as_ptr() as usize, align);
    // SAFETY: shift <= align, so both the aligned pointer and the shift byte
    // at `aligned - 1` stay inside the `align` bytes the caller vouches for.
    unsafe {
        let aligned = raw.as_ptr().add(shift);
        aligned.sub(1).write(encode_shift(shift));
        NonNull::new_unchecked(aligned)
    }
}

/// Reads the shift stored before a pointer produced by [`align_ptr_store`]
///
/// # Safety
/// The byte at `aligned - 1` must be readable.
#[inline]
pub unsafe fn stored_shift(aligned: NonNull<u8>) -> usize {
    // SAFETY: caller guarantees the preceding byte is readable.
    decode_shift(unsafe { aligned.as_ptr().sub(1).read() })
}

/// Recovers the raw base of a pointer produced by [`align_ptr_store`]
///
/// # Safety
/// `aligned` must have been returned by [`align_ptr_store`] and its shift
/// byte must not have been overwritten since.
#[inline]
pub unsafe fn unalign_ptr(aligned: NonNull<u8>) -> NonNull<u8> {
    // SAFETY: the shift byte was written by align_ptr_store and the raw base
    // lies `shift` bytes before the aligned pointer in the same allocation.
    unsafe {
        let shift = stored_shift(aligned);
        NonNull::new_unchecked(aligned.as_ptr().sub(shift))
    }
}
