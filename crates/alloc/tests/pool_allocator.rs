//! Integration tests for Pool allocator

use std::collections::HashSet;

use nebula_alloc::allocator::{MemoryUsage, PoolAllocator, PoolConfig};
use nebula_alloc::{Align, MemoryError};
use pretty_assertions::assert_eq;

#[derive(Debug, Clone, PartialEq)]
struct Item {
    id: u32,
    weight: f64,
}

#[test]
fn test_pool_lifo_reuse() {
    let pool = PoolAllocator::<Item>::with_config(3, Align::ONE, PoolConfig::default())
        .expect("Failed to create pool allocator");

    let a = pool.alloc().expect("first alloc failed");
    let b = pool.alloc().expect("second alloc failed");
    let c = pool.alloc().expect("third alloc failed");

    let distinct: HashSet<usize> = [a, b, c].iter().map(|p| p.as_ptr() as usize).collect();
    assert_eq!(distinct.len(), 3);
    assert!(pool.alloc().is_none(), "fourth alloc should fail");
    assert!(pool.is_full());

    unsafe { pool.free(b.as_ptr()).expect("free failed") };
    let reused = pool.alloc().expect("alloc after free failed");
    assert_eq!(reused, b, "pool should reuse the freed slot first");
}

#[test]
fn test_pool_counts_stay_consistent() {
    let pool = PoolAllocator::<u64>::performance(4, Align::ONE).unwrap();
    let mut live = Vec::new();

    for _ in 0..4 {
        live.push(pool.alloc().unwrap());
        assert_eq!(pool.free_count() + pool.used_count(), pool.capacity());
    }
    while let Some(ptr) = live.pop() {
        unsafe { pool.free(ptr.as_ptr()).unwrap() };
        assert_eq!(pool.free_count() + pool.used_count(), pool.capacity());
    }
    assert!(pool.is_empty());
}

#[test]
fn test_new_with_and_delete_run_drop() {
    use std::rc::Rc;

    let tracker = Rc::new(());
    let pool = PoolAllocator::<Rc<()>>::performance(2, Align::ONE).unwrap();

    let slot = pool.new_with(|| Rc::clone(&tracker)).unwrap();
    assert_eq!(Rc::strong_count(&tracker), 2);

    unsafe { pool.delete(slot.as_ptr()).unwrap() };
    assert_eq!(Rc::strong_count(&tracker), 1);
    assert!(pool.is_empty());
}

#[test]
fn test_free_null_is_noop() {
    let pool = PoolAllocator::<Item>::performance(1, Align::ONE).unwrap();
    pool.alloc().unwrap();
    unsafe {
        pool.free(std::ptr::null_mut()).unwrap();
        pool.delete(std::ptr::null_mut()).unwrap();
    }
    assert_eq!(pool.used_count(), 1);
}

#[test]
fn test_double_free_is_reported() {
    let pool = PoolAllocator::<Item>::performance(2, Align::ONE).unwrap();
    let _first = pool.alloc().unwrap();
    let second = pool.alloc().unwrap();

    unsafe {
        pool.free(second.as_ptr()).unwrap();
        let error = pool.free(second.as_ptr()).unwrap_err();
        assert_eq!(error, MemoryError::DoubleFree { slot: 1 });
    }
    assert_eq!(pool.used_count(), 1);
}

#[test]
fn test_foreign_pointer_is_rejected() {
    let pool = PoolAllocator::<Item>::performance(2, Align::ONE).unwrap();
    let other = PoolAllocator::<Item>::performance(2, Align::ONE).unwrap();
    let foreign = other.alloc().unwrap();

    let error = unsafe { pool.free(foreign.as_ptr()) }.unwrap_err();
    assert_eq!(error.code(), "MEM:POOL:POINTER");

    let mut local = Item { id: 1, weight: 0.5 };
    let error = unsafe { pool.free(&raw mut local) }.unwrap_err();
    assert_eq!(error.code(), "MEM:POOL:POINTER");
    assert_eq!(local, Item { id: 1, weight: 0.5 });
}

#[test]
fn test_requested_alignment_is_honoured() {
    for bytes in [1, 8, 32, 128, 256] {
        let align = Align::new(bytes).unwrap();
        let pool = PoolAllocator::<[u8; 3]>::debug(5, align).unwrap();
        for _ in 0..5 {
            let slot = pool.alloc().unwrap();
            assert_eq!(slot.as_ptr() as usize % bytes, 0);
            assert!(pool.contains(slot.as_ptr()));
        }
        assert_eq!(pool.slot_size(), size_of::<usize>() + bytes);
    }
}

#[test]
fn test_written_values_survive_neighbour_frees() {
    let pool = PoolAllocator::<Item>::debug(3, Align::new(16).unwrap()).unwrap();
    let a = pool.new_with(|| Item { id: 1, weight: 1.0 }).unwrap();
    let b = pool.new_with(|| Item { id: 2, weight: 2.0 }).unwrap();
    let c = pool.new_with(|| Item { id: 3, weight: 3.0 }).unwrap();

    unsafe {
        pool.delete(b.as_ptr()).unwrap();
        assert_eq!(*a.as_ptr(), Item { id: 1, weight: 1.0 });
        assert_eq!(*c.as_ptr(), Item { id: 3, weight: 3.0 });
    }
}

#[test]
fn test_stats_and_usage() {
    let pool = PoolAllocator::<u32>::production(4, Align::ONE).unwrap();
    let a = pool.alloc().unwrap();
    pool.alloc().unwrap();
    unsafe { pool.free(a.as_ptr()).unwrap() };

    let stats = pool.stats();
    assert_eq!(stats.total_allocs, 2);
    assert_eq!(stats.total_deallocs, 1);
    assert_eq!(stats.block_count, 4);
    assert_eq!(stats.free_blocks, 3);
    assert_eq!(stats.used_blocks(), 1);
    assert_eq!(stats.peak_usage, 2 * pool.slot_size());
    assert_eq!(pool.used_memory(), pool.slot_size());
    assert_eq!(pool.available_memory(), Some(3 * pool.slot_size()));
}

#[test]
fn test_rejects_empty_pool() {
    let error = PoolAllocator::<u32>::new(0, Align::ONE).unwrap_err();
    assert_eq!(error.code(), "MEM:ALLOC:SIZE");
}
