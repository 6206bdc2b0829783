// @file: kline_engine/src/bench/alloc.rs
// @description: Counting global allocator used by the harness to attribute allocations to a decoder.
// @author: LAS.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicU64, Ordering};

//
// GLOBAL COUNTERS
//

static ALLOCATIONS: AtomicU64 = AtomicU64::new(0);
static ALLOCATED_BYTES: AtomicU64 = AtomicU64::new(0);

/// Wraps the system allocator and counts every allocation and reallocation.
///
/// Install it in a binary with
/// `#[global_allocator] static GLOBAL: CountingAllocator = CountingAllocator;`.
/// Counters are process-wide, so measurements are only meaningful while a
/// single thread is decoding.
pub struct CountingAllocator;

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        record(layout.size());
        System.alloc(layout)
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        record(layout.size());
        System.alloc_zeroed(layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        record(new_size);
        System.realloc(ptr, layout, new_size)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }
}

fn record(size: usize) {
    ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
    ALLOCATED_BYTES.fetch_add(size as u64, Ordering::Relaxed);
}


//
// SNAPSHOTS
//

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocSnapshot {
    pub allocations: u64,
    pub bytes: u64,
}

impl AllocSnapshot {
    pub fn take() -> Self {
        AllocSnapshot {
            allocations: ALLOCATIONS.load(Ordering::Relaxed),
            bytes: ALLOCATED_BYTES.load(Ordering::Relaxed),
        }
    }

    // Counter delta between `earlier` and `self`
    pub fn since(self, earlier: AllocSnapshot) -> AllocSnapshot {
        AllocSnapshot {
            allocations: self.allocations.saturating_sub(earlier.allocations),
            bytes: self.bytes.saturating_sub(earlier.bytes),
        }
    }
}

// True when CountingAllocator is the process's global allocator.
pub fn counting_enabled() -> bool {
    let before: AllocSnapshot = AllocSnapshot::take();
    let probe: Box<u64> = std::hint::black_box(Box::new(0));
    drop(probe);
    AllocSnapshot::take().allocations > before.allocations
}
