use std::alloc::Layout;
use std::ptr;
use std::sync::Arc;
mod debug;
mod getters;
mod tracking;

pub use tracking::TrackingAllocator;

/// Source of raw memory for message buffers.
///
/// This is the seam between the real binding and test substitutes: the
/// lifecycle code only ever talks to a `BufferAllocator`.
///
/// # Safety
/// Implementors must return either null or a pointer valid for reads and
/// writes of `layout.size()` bytes, aligned to `layout.align()`, that stays
/// valid until it is passed back to `release` on the same allocator.
pub unsafe trait BufferAllocator {
    /// Allocate an uninitialized block. Returns null when the request cannot be satisfied.
    fn allocate(&self, layout: Layout) -> *mut u8;

    /// Allocate a block with every byte set to zero. Returns null on failure.
    fn allocate_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = self.allocate(layout);
        if !ptr.is_null() {
            unsafe { ptr::write_bytes(ptr, 0, layout.size()) };
        }
        ptr
    }

    /// Return a block to the allocator.
    ///
    /// # Safety
    /// `ptr` must have come from `allocate`/`allocate_zeroed` on this
    /// allocator with the same `layout`, and must not have been released yet.
    unsafe fn release(&self, ptr: *mut u8, layout: Layout);

    /// Short name used in debug output and logs.
    fn name(&self) -> &'static str {
        "custom"
    }
}

/// The C heap, shared with the native messaging library.
#[derive(Debug, Default, Clone, Copy)]
pub struct Malloc;

// glibc and musl both guarantee 2 * sizeof(size_t) for plain malloc.
const MALLOC_MIN_ALIGN: usize = 2 * std::mem::size_of::<usize>();

unsafe impl BufferAllocator for Malloc {
    fn allocate(&self, layout: Layout) -> *mut u8 {
        if layout.align() <= MALLOC_MIN_ALIGN && layout.align() <= layout.size() {
            return unsafe { libc::malloc(layout.size()) as *mut u8 };
        }

        // Over-aligned request: posix_memalign needs at least pointer alignment.
        let align = layout.align().max(std::mem::size_of::<usize>());
        let mut out: *mut libc::c_void = ptr::null_mut();
        let rc = unsafe { libc::posix_memalign(&mut out, align, layout.size()) };
        if rc != 0 {
            return ptr::null_mut();
        }
        out as *mut u8
    }

    fn allocate_zeroed(&self, layout: Layout) -> *mut u8 {
        if layout.align() <= MALLOC_MIN_ALIGN && layout.align() <= layout.size() {
            return unsafe { libc::calloc(1, layout.size()) as *mut u8 };
        }
        let ptr = self.allocate(layout);
        if !ptr.is_null() {
            unsafe { ptr::write_bytes(ptr, 0, layout.size()) };
        }
        ptr
    }

    unsafe fn release(&self, ptr: *mut u8, _layout: Layout) {
        libc::free(ptr as *mut libc::c_void)
    }

    fn name(&self) -> &'static str {
        "malloc"
    }
}

/// Rust's global allocator (whatever `#[global_allocator]` is in effect).
#[derive(Debug, Default, Clone, Copy)]
pub struct RustHeap;

unsafe impl BufferAllocator for RustHeap {
    fn allocate(&self, layout: Layout) -> *mut u8 {
        if layout.size() == 0 {
            return ptr::null_mut();
        }
        unsafe { std::alloc::alloc(layout) }
    }

    fn allocate_zeroed(&self, layout: Layout) -> *mut u8 {
        if layout.size() == 0 {
            return ptr::null_mut();
        }
        unsafe { std::alloc::alloc_zeroed(layout) }
    }

    unsafe fn release(&self, ptr: *mut u8, layout: Layout) {
        std::alloc::dealloc(ptr, layout)
    }

    fn name(&self) -> &'static str {
        "rust-heap"
    }
}

unsafe impl<A: BufferAllocator + ?Sized> BufferAllocator for &A {
    fn allocate(&self, layout: Layout) -> *mut u8 {
        (**self).allocate(layout)
    }

    fn allocate_zeroed(&self, layout: Layout) -> *mut u8 {
        (**self).allocate_zeroed(layout)
    }

    unsafe fn release(&self, ptr: *mut u8, layout: Layout) {
        (**self).release(ptr, layout)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

unsafe impl<A: BufferAllocator + ?Sized> BufferAllocator for Arc<A> {
    fn allocate(&self, layout: Layout) -> *mut u8 {
        (**self).allocate(layout)
    }

    fn allocate_zeroed(&self, layout: Layout) -> *mut u8 {
        (**self).allocate_zeroed(layout)
    }

    unsafe fn release(&self, ptr: *mut u8, layout: Layout) {
        (**self).release(ptr, layout)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
