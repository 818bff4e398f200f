use crate::Core::alloc::{BufferAllocator, Malloc};
use crate::Core::buffer::MessageBuffer;
use crate::Core::layout::{layout_matches, RawMessage, MSG_ALIGN, MSG_SIZE};
use log::{error, trace};
use std::ptr;

// Error codes
pub const MSGBUF_SUCCESS: i32 = 0;
pub const MSGBUF_ERROR_LAYOUT_MISMATCH: i32 = -2;

// -----------------------------------------------------------------------------
// Lifecycle API
// -----------------------------------------------------------------------------

/// Allocate one message buffer on the C heap.
///
/// The contents are uninitialized; pass the pointer to the native library's
/// message init call before using it.
///
/// # Returns
/// * Pointer to the buffer, or NULL when the allocator is exhausted.
#[no_mangle]
pub extern "C" fn msgbuf_create() -> *mut RawMessage {
    trace!("Call to msgbuf_create");
    create_handle(Malloc, false)
}

/// Allocate one zero-filled message buffer on the C heap.
///
/// # Returns
/// * Pointer to the buffer, or NULL when the allocator is exhausted.
#[no_mangle]
pub extern "C" fn msgbuf_create_zeroed() -> *mut RawMessage {
    trace!("Call to msgbuf_create_zeroed");
    create_handle(Malloc, true)
}

fn create_handle<A: BufferAllocator>(alloc: A, zeroed: bool) -> *mut RawMessage {
    let result = if zeroed {
        MessageBuffer::create_zeroed_in(alloc)
    } else {
        MessageBuffer::create_in(alloc)
    };

    match result {
        Ok(buffer) => buffer.into_raw_parts().0.as_ptr(),
        Err(e) => {
            error!("FFI Error: Failed to create message buffer: {}", e);
            ptr::null_mut()
        }
    }
}

/// Release a buffer returned by `msgbuf_create` or `msgbuf_create_zeroed`.
/// NULL is ignored.
///
/// # Safety
/// `handle` must come from this library's create calls and must not have been
/// destroyed already. Neither condition is checked.
#[no_mangle]
pub unsafe extern "C" fn msgbuf_destroy(handle: *mut RawMessage) {
    trace!("Call to msgbuf_destroy with handle {:?}", handle);
    destroy_handle(handle, Malloc);
}

unsafe fn destroy_handle<A: BufferAllocator>(handle: *mut RawMessage, alloc: A) {
    if let Some(ptr) = ptr::NonNull::new(handle) {
        MessageBuffer::from_raw_parts(ptr, alloc).destroy(); // Dropped back to its allocator
    }
}

// -----------------------------------------------------------------------------
// Layout API
// -----------------------------------------------------------------------------

/// Size in bytes of one message buffer.
#[no_mangle]
pub extern "C" fn msgbuf_size() -> usize {
    MSG_SIZE
}

/// Alignment in bytes of one message buffer.
#[no_mangle]
pub extern "C" fn msgbuf_align() -> usize {
    MSG_ALIGN
}

/// Compare the caller's view of the message struct with the shim's.
///
/// # Arguments
/// * `size` - `sizeof(zmq_msg_t)` as compiled on the caller's side.
/// * `align` - `alignof(zmq_msg_t)` as compiled on the caller's side.
///
/// # Returns
/// * 0 when both match, MSGBUF_ERROR_LAYOUT_MISMATCH otherwise.
#[no_mangle]
pub extern "C" fn msgbuf_check_layout(size: usize, align: usize) -> i32 {
    if layout_matches(size, align) {
        MSGBUF_SUCCESS
    } else {
        error!(
            "FFI Error: message layout mismatch: caller {}/{}, shim {}/{}",
            size, align, MSG_SIZE, MSG_ALIGN
        );
        MSGBUF_ERROR_LAYOUT_MISMATCH
    }
}
