//! Log levels emitted by marker checks and frame release
//!
//! Stale markers are an expected answer from `check_marker` and from frames
//! released by an outer rewind, so they must not surface as error events.
//! Caller bugs such as a double free still do.

#![cfg(feature = "logging")]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use nebula_alloc::Align;
use nebula_alloc::allocator::{DoubleStackAllocator, PoolAllocator, Side, StackAllocator, StackFrame};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Registry;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Counts `ERROR` events
#[derive(Clone, Default)]
struct ErrorCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }
}

fn count_errors(f: impl FnOnce()) -> usize {
    let counter = ErrorCounter::default();
    let subscriber = Registry::default().with(counter.clone());
    tracing::subscriber::with_default(subscriber, f);
    counter.0.load(Ordering::Relaxed)
}

#[test]
fn test_stale_stack_marker_check_is_quiet() {
    let errors = count_errors(|| {
        let allocator = StackAllocator::performance(64).unwrap();
        let base = allocator.marker();
        allocator.alloc(8).unwrap();
        let stale = allocator.marker();
        unsafe { allocator.free_to_marker(base).unwrap() };
        assert!(allocator.check_marker(stale).is_err());
    });
    assert_eq!(errors, 0);
}

#[test]
fn test_frame_after_outer_rewind_is_quiet() {
    let errors = count_errors(|| {
        let allocator = StackAllocator::performance(64).unwrap();
        let outer = allocator.marker();
        allocator.alloc(4).unwrap();
        let frame = unsafe { StackFrame::new(&allocator) };
        unsafe { allocator.free_to_marker(outer).unwrap() };
        frame.restore();
        assert!(allocator.is_empty());
    });
    assert_eq!(errors, 0);
}

#[test]
fn test_stale_side_marker_check_is_quiet() {
    let errors = count_errors(|| {
        let allocator = DoubleStackAllocator::performance(64).unwrap();
        let base = allocator.marker(Side::Right);
        allocator.alloc(Side::Right, 8).unwrap();
        let stale = allocator.marker(Side::Right);
        unsafe { allocator.free_to_marker(base).unwrap() };
        assert!(allocator.check_marker(stale).is_err());
    });
    assert_eq!(errors, 0);
}

#[test]
fn test_double_free_is_logged_as_error() {
    let errors = count_errors(|| {
        let pool = PoolAllocator::<u64>::performance(2, Align::ONE).unwrap();
        let slot = pool.alloc().unwrap();
        unsafe {
            pool.free(slot.as_ptr()).unwrap();
            assert!(pool.free(slot.as_ptr()).is_err());
        }
    });
    assert!(errors >= 1);
}
