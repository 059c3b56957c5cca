//! Integration tests for typed handles and the new_ptr / delete_ptr factories

use std::cell::Cell;

use nebula_alloc::allocator::{
    DoubleStackAllocator, PoolAllocator, PtrState, Side, StackAllocator, double_stack, pool, stack,
};
use nebula_alloc::{Align, MemoryError};
use pretty_assertions::assert_eq;

#[derive(Debug, PartialEq)]
struct Vec3 {
    x: f32,
    y: f32,
    z: f32,
}

impl Vec3 {
    fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Counts drops into a shared cell
struct DropCounter<'a>(&'a Cell<usize>);

impl Drop for DropCounter<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

#[test]
fn test_stack_new_and_delete() {
    let allocator = StackAllocator::performance(256).unwrap();

    let mut handle = stack::new_ptr(&allocator, || Vec3::new(1.0, 2.0, 3.0)).unwrap();
    assert_eq!(handle.state(), PtrState::Live);
    assert_eq!(*handle, Vec3::new(1.0, 2.0, 3.0));

    handle.y = 5.0;
    assert_eq!(handle.try_get().unwrap().y, 5.0);

    unsafe { stack::delete_ptr(&mut handle).unwrap() };
    assert_eq!(handle.state(), PtrState::Released);
    assert!(handle.as_ptr().is_null());
    assert!(allocator.is_empty());
}

#[test]
fn test_stack_new_ptr_not_enough_memory() {
    let allocator = StackAllocator::performance(5).unwrap();
    let mut constructed = false;

    let error = stack::new_ptr(&allocator, || {
        constructed = true;
        Vec3::new(0.0, 0.0, 0.0)
    })
    .unwrap_err();

    assert!(!constructed, "initializer must not run on exhaustion");
    assert!(matches!(error, MemoryError::StackExhausted { capacity: 5, used: 0, .. }));
    assert!(error.is_retryable());
    assert!(allocator.is_empty());
}

#[test]
fn test_stack_delete_runs_drop_once() {
    let drops = Cell::new(0);
    let allocator = StackAllocator::performance(64).unwrap();

    let mut handle = stack::new_ptr(&allocator, || DropCounter(&drops)).unwrap();
    unsafe { stack::delete_ptr(&mut handle).unwrap() };
    assert_eq!(drops.get(), 1);

    let error = unsafe { stack::delete_ptr(&mut handle) }.unwrap_err();
    assert_eq!(error, MemoryError::HandleNotLive { state: PtrState::Released });
    assert_eq!(drops.get(), 1);
}

#[test]
fn test_stack_delete_wrong_order() {
    let drops = Cell::new(0);
    let allocator = StackAllocator::performance(256).unwrap();

    let mut first = stack::new_ptr(&allocator, || DropCounter(&drops)).unwrap();
    let mut second = stack::new_ptr(&allocator, || DropCounter(&drops)).unwrap();

    unsafe {
        stack::delete_ptr(&mut first).unwrap();
        // `second` lived above `first`, so its memory is already gone.
        let error = stack::delete_ptr(&mut second).unwrap_err();
        assert!(error.is_invalid_marker());
    }
    assert!(second.is_live());
    assert_eq!(drops.get(), 1);
}

#[test]
fn test_stack_aligned_handle() {
    let allocator = StackAllocator::performance(512).unwrap();
    allocator.alloc(1).unwrap();

    let align = Align::new(64).unwrap();
    let mut handle = stack::new_ptr_aligned(&allocator, align, || [7u32; 4]).unwrap();
    assert_eq!(handle.as_ptr() as usize % 64, 0);
    assert_eq!(handle[3], 7);

    let marker = handle.data().unwrap().marker();
    assert_eq!(marker.position(), 1);
    unsafe { stack::delete_ptr(&mut handle).unwrap() };
    assert_eq!(allocator.used(), 1);
}

#[repr(align(512))]
struct OverAligned(u8);

#[test]
fn test_stack_aligned_handle_rejects_over_aligned_type() {
    let allocator = StackAllocator::performance(65536).unwrap();
    let mut called = false;

    let error = stack::new_ptr_aligned(&allocator, Align::ONE, || {
        called = true;
        OverAligned(1)
    })
    .unwrap_err();

    assert_eq!(error, MemoryError::invalid_alignment(512));
    assert!(!error.is_retryable());
    assert!(!called);
    assert!(allocator.is_empty());

    // Without an explicit alignment the layout padding handles it.
    let handle = stack::new_ptr(&allocator, || OverAligned(2)).unwrap();
    assert_eq!(handle.as_ptr() as usize % 512, 0);
    assert_eq!(handle.0, 2);
}

#[test]
fn test_double_stack_aligned_handle_rejects_over_aligned_type() {
    let allocator = DoubleStackAllocator::performance(65536).unwrap();

    for side in [Side::Left, Side::Right] {
        let error = double_stack::new_ptr_aligned(&allocator, side, Align::ONE, || OverAligned(1))
            .unwrap_err();
        assert_eq!(error.code(), "MEM:ALLOC:ALIGN");
        assert!(!error.is_retryable());
    }
    assert!(allocator.is_empty_both());
}

#[test]
fn test_aligned_exhaustion_reports_effective_alignment() {
    let allocator = StackAllocator::performance(8).unwrap();
    let error = stack::new_ptr_aligned(&allocator, Align::ONE, || 0u64).unwrap_err();
    assert_eq!(
        error,
        MemoryError::StackExhausted {
            capacity: 8,
            used: 0,
            requested: 8 + align_of::<u64>(),
        }
    );
}

#[test]
fn test_unborn_handle_errors() {
    let mut handle: stack::StackPtr<'_, u32> = Default::default();
    assert_eq!(handle.state(), PtrState::Unborn);
    assert_eq!(
        handle.try_get_mut().unwrap_err(),
        MemoryError::HandleNotLive { state: PtrState::Unborn }
    );
    let error = unsafe { stack::delete_ptr(&mut handle) }.unwrap_err();
    assert_eq!(error.code(), "MEM:PTR:NOT_LIVE");
}

#[test]
#[should_panic(expected = "cannot dereference handle")]
fn test_deref_released_handle_panics() {
    let allocator = StackAllocator::performance(64).unwrap();
    let mut handle = stack::new_ptr(&allocator, || 3u8).unwrap();
    unsafe { stack::delete_ptr(&mut handle).unwrap() };
    let _value: u8 = *handle;
}

#[test]
fn test_dropping_live_handle_keeps_memory() {
    let drops = Cell::new(0);
    let allocator = StackAllocator::performance(64).unwrap();
    {
        let _handle = stack::new_ptr(&allocator, || DropCounter(&drops)).unwrap();
    }
    assert_eq!(drops.get(), 0);
    assert!(!allocator.is_empty());
}

#[test]
fn test_double_stack_handles() {
    let allocator = DoubleStackAllocator::performance(256).unwrap();

    let mut left = double_stack::new_ptr(&allocator, Side::Left, || Vec3::new(1.0, 0.0, 0.0)).unwrap();
    let mut right = double_stack::new_ptr(&allocator, Side::Right, || 0xABCD_u64).unwrap();

    assert_eq!(right.data().unwrap().side(), Side::Right);
    assert_eq!(right.as_ptr() as usize % align_of::<u64>(), 0);
    assert_eq!(left.x, 1.0);
    assert_eq!(*right, 0xABCD);

    unsafe {
        double_stack::delete_ptr(&mut right).unwrap();
        assert!(allocator.is_empty(Side::Right));
        double_stack::delete_ptr(&mut left).unwrap();
    }
    assert!(allocator.is_empty_both());
}

#[test]
fn test_double_stack_delete_wrong_order() {
    let allocator = DoubleStackAllocator::performance(256).unwrap();

    let mut lower = double_stack::new_ptr(&allocator, Side::Right, || 1u32).unwrap();
    let mut upper = double_stack::new_ptr(&allocator, Side::Right, || 2u32).unwrap();

    unsafe {
        double_stack::delete_ptr(&mut lower).unwrap();
        let error = double_stack::delete_ptr(&mut upper).unwrap_err();
        assert!(matches!(
            error,
            MemoryError::InvalidSideMarker {
                side: Side::Right,
                ..
            }
        ));
    }
    assert!(upper.is_live());
}

#[test]
fn test_double_stack_overlap_error() {
    let allocator = DoubleStackAllocator::performance(16).unwrap();
    allocator.alloc(Side::Left, 12).unwrap();

    let error = double_stack::new_ptr(&allocator, Side::Right, || [0u8; 8]).unwrap_err();
    assert_eq!(
        error,
        MemoryError::DoubleStackOverlap {
            side: Side::Right,
            capacity: 16,
            left: 12,
            right: 16,
            requested: 8,
        }
    );
    assert!(error.to_string().contains("RIGHT"));
}

#[test]
fn test_double_stack_aligned_handle() {
    let allocator = DoubleStackAllocator::performance(512).unwrap();
    let align = Align::new(32).unwrap();
    let mut handle =
        double_stack::new_ptr_aligned(&allocator, Side::Left, align, || 42u16).unwrap();
    assert_eq!(handle.as_ptr() as usize % 32, 0);
    assert_eq!(allocator.used(Side::Left), 2 + 32);
    unsafe { double_stack::delete_ptr(&mut handle).unwrap() };
    assert!(allocator.is_empty(Side::Left));
}

#[test]
fn test_pool_handles() {
    let drops = Cell::new(0);
    let allocator = PoolAllocator::<DropCounter<'_>>::performance(2, Align::ONE).unwrap();

    let mut a = pool::new_ptr(&allocator, || DropCounter(&drops)).unwrap();
    let mut b = pool::new_ptr(&allocator, || DropCounter(&drops)).unwrap();

    let mut called = false;
    let error = pool::new_ptr(&allocator, || {
        called = true;
        DropCounter(&drops)
    })
    .unwrap_err();
    assert!(!called);
    assert_eq!(error, MemoryError::PoolExhausted { capacity: 2, free: 0 });

    // Pool slots are independent, so any release order works.
    pool::delete_ptr(&mut a).unwrap();
    pool::delete_ptr(&mut b).unwrap();
    assert_eq!(drops.get(), 2);
    assert!(allocator.is_empty());

    assert_eq!(
        pool::delete_ptr(&mut a).unwrap_err(),
        MemoryError::HandleNotLive { state: PtrState::Released }
    );
}

#[test]
fn test_handles_compare_by_address() {
    let allocator = PoolAllocator::<u32>::performance(2, Align::ONE).unwrap();
    let a = pool::new_ptr(&allocator, || 1).unwrap();
    let b = pool::new_ptr(&allocator, || 1).unwrap();
    assert_ne!(a, b);
    assert_eq!(pool::PoolPtr::<u32>::default(), pool::PoolPtr::<u32>::default());
}
