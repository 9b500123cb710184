//! The byte-slice search fast path must not allocate: `index_of` on an
//! identity-bytes cursor compares raw value windows without materializing
//! decoded payloads.
//!
//! Kept in its own test binary so the counting allocator observes only this
//! test.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

use flatdict::{build_v1, ByteWindow, BytesCodec, IndexedDict};

// ============================================================================
// Counting allocator
// ============================================================================

struct CountingAllocator;

static ALLOCATIONS: AtomicUsize = AtomicUsize::new(0);

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        ALLOCATIONS.fetch_add(1, Ordering::SeqCst);
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        ALLOCATIONS.fetch_add(1, Ordering::SeqCst);
        System.realloc(ptr, layout, new_size)
    }
}

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

// ============================================================================
// Test
// ============================================================================

#[test]
fn byte_slice_search_does_not_allocate() {
    let keys: Vec<Vec<u8>> = (0..1000).map(|i| format!("key{:04}", i).into_bytes()).collect();
    let blob = build_v1(BytesCodec, keys.iter().map(|k| Some(k.as_slice()))).unwrap();

    let mut window = ByteWindow::new(&blob);
    let dict = IndexedDict::read(&mut window, BytesCodec).unwrap();
    let mut cursor = dict.single_threaded();

    let hit: &[u8] = b"key0777";
    let miss: &[u8] = b"key0777z";

    // Warm up outside the measured region.
    assert_eq!(cursor.index_of(Some(&hit)).unwrap(), 777);
    assert_eq!(cursor.index_of(Some(&miss)).unwrap(), -779);

    let before = ALLOCATIONS.load(Ordering::SeqCst);
    for _ in 0..100 {
        assert_eq!(cursor.index_of(Some(&hit)).unwrap(), 777);
        assert_eq!(cursor.index_of(Some(&miss)).unwrap(), -779);
        assert_eq!(cursor.index_of(None).unwrap(), -1);
    }
    let after = ALLOCATIONS.load(Ordering::SeqCst);

    assert_eq!(
        after - before,
        0,
        "byte-slice binary search allocated on the hot path"
    );
}
