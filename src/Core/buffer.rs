use crate::Core::alloc::{BufferAllocator, Malloc};
use crate::Core::builder::BufferBuilder;
use crate::Core::layout::{message_layout, RawMessage};
use log::debug;
use std::fmt;
use std::io;
use std::mem::ManuallyDrop;
use std::ptr::{self, NonNull};

/// Owned handle to one heap-allocated [`RawMessage`].
///
/// The handle is move-only. It is released exactly once: either explicitly
/// through [`MessageBuffer::destroy`], implicitly when it goes out of scope,
/// or by the native side after [`MessageBuffer::into_raw`] hands it over.
///
/// Using a buffer after destroying it does not compile:
///
/// ```compile_fail
/// use msgbuf_shim::MessageBuffer;
///
/// let buf = MessageBuffer::create().unwrap();
/// buf.destroy();
/// buf.destroy();
/// ```
pub struct MessageBuffer<A: BufferAllocator = Malloc> {
    ptr: NonNull<RawMessage>,
    alloc: A,
}

// The block is exclusively owned; shared access only ever hands out `*const`.
unsafe impl<A: BufferAllocator + Send> Send for MessageBuffer<A> {}
unsafe impl<A: BufferAllocator + Sync> Sync for MessageBuffer<A> {}

impl MessageBuffer<Malloc> {
    /// Allocate an uninitialized buffer on the C heap.
    pub fn create() -> io::Result<Self> {
        BufferBuilder::new().build()
    }

    /// Allocate a zero-filled buffer on the C heap.
    pub fn create_zeroed() -> io::Result<Self> {
        BufferBuilder::new().zeroed(true).build()
    }

    /// Allocate a buffer, run `f` on it and release it on every exit path.
    pub fn scoped<R>(f: impl FnOnce(&mut MessageBuffer<Malloc>) -> R) -> io::Result<R> {
        BufferBuilder::new().scoped(f)
    }

    /// Give up ownership; the pointer must come back through
    /// [`MessageBuffer::from_raw`] (or the C `msgbuf_destroy`) to be released.
    pub fn into_raw(self) -> *mut RawMessage {
        let (ptr, _) = self.into_raw_parts();
        ptr.as_ptr()
    }

    /// Reclaim a pointer produced by [`MessageBuffer::into_raw`]. Null yields `None`.
    ///
    /// # Safety
    /// `ptr` must have been produced by `into_raw` (or `msgbuf_create*`) and
    /// must not have been reclaimed or destroyed since.
    pub unsafe fn from_raw(ptr: *mut RawMessage) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self::from_raw_parts(ptr, Malloc))
    }
}

impl<A: BufferAllocator> MessageBuffer<A> {
    /// Allocate an uninitialized buffer from `alloc`.
    pub fn create_in(alloc: A) -> io::Result<Self> {
        Self::allocate(alloc, false)
    }

    /// Allocate a zero-filled buffer from `alloc`.
    pub fn create_zeroed_in(alloc: A) -> io::Result<Self> {
        Self::allocate(alloc, true)
    }

    pub(crate) fn allocate(alloc: A, zeroed: bool) -> io::Result<Self> {
        let layout = message_layout();
        let raw = if zeroed {
            alloc.allocate_zeroed(layout)
        } else {
            alloc.allocate(layout)
        };

        match NonNull::new(raw as *mut RawMessage) {
            Some(ptr) => Ok(Self { ptr, alloc }),
            None => {
                debug!(
                    "MessageBuffer: {} allocator refused {} bytes",
                    alloc.name(),
                    layout.size()
                );
                Err(io::Error::new(
                    io::ErrorKind::OutOfMemory,
                    format!(
                        "Failed to allocate message buffer:\n\
                    ├─ Allocator: {}\n\
                    ├─ Size:      {}\n\
                    ╰─ Align:     {}",
                        alloc.name(),
                        layout.size(),
                        layout.align()
                    ),
                ))
            }
        }
    }

    /// Release the buffer now. Equivalent to dropping it.
    pub fn destroy(self) {
        drop(self)
    }

    /// Pointer to hand to the native library's message functions.
    pub fn as_ptr(&self) -> *const RawMessage {
        self.ptr.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut RawMessage {
        self.ptr.as_ptr()
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Split into the raw block and its allocator without releasing anything.
    pub fn into_raw_parts(self) -> (NonNull<RawMessage>, A) {
        let this = ManuallyDrop::new(self);
        // `this` is never dropped, so the allocator is moved out exactly once.
        let alloc = unsafe { ptr::read(&this.alloc) };
        (this.ptr, alloc)
    }

    /// Rebuild a handle from [`MessageBuffer::into_raw_parts`].
    ///
    /// # Safety
    /// `ptr` must have been allocated by `alloc` with the message layout and
    /// must not be owned by any other handle.
    pub unsafe fn from_raw_parts(ptr: NonNull<RawMessage>, alloc: A) -> Self {
        Self { ptr, alloc }
    }
}

impl<A: BufferAllocator> Drop for MessageBuffer<A> {
    fn drop(&mut self) {
        unsafe {
            self.alloc
                .release(self.ptr.as_ptr() as *mut u8, message_layout());
        }
    }
}

impl<A: BufferAllocator> fmt::Debug for MessageBuffer<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_message_buffer(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Core::alloc::{RustHeap, TrackingAllocator};
    use crate::Core::layout::{MSG_ALIGN, MSG_SIZE};

    #[test]
    fn create_is_aligned() {
        let buf = MessageBuffer::create().unwrap();
        assert_eq!(buf.as_ptr() as usize % MSG_ALIGN, 0);
    }

    #[test]
    fn zeroed_buffer_reads_zero() {
        let buf = MessageBuffer::create_zeroed_in(RustHeap).unwrap();
        let raw = unsafe { &*buf.as_ptr() };
        assert_eq!(raw.opaque, [0u8; MSG_SIZE]);
    }

    #[test]
    fn drop_releases_once() {
        let tracker = TrackingAllocator::new(RustHeap);
        {
            let _buf = MessageBuffer::create_in(&tracker).unwrap();
            assert_eq!(tracker.live(), 1);
        }
        assert!(tracker.is_balanced());
        assert_eq!(tracker.total_releases(), 1);
    }

    #[test]
    fn raw_parts_round_trip_keeps_ownership() {
        let tracker = TrackingAllocator::new(RustHeap);
        let buf = MessageBuffer::create_in(&tracker).unwrap();

        let (ptr, alloc) = buf.into_raw_parts();
        assert_eq!(tracker.live(), 1);

        let buf = unsafe { MessageBuffer::from_raw_parts(ptr, alloc) };
        buf.destroy();
        assert!(tracker.is_balanced());
    }

    #[test]
    fn exhausted_allocator_reports_out_of_memory() {
        let err = MessageBuffer::create_in(TrackingAllocator::exhausted()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::OutOfMemory);
    }

    #[test]
    fn debug_does_not_read_contents() {
        let buf = MessageBuffer::create().unwrap();
        let out = format!("{:?}", buf);
        assert!(out.contains("MessageBuffer"));
        assert!(out.contains("malloc"));
    }
}
