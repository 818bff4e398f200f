use std::alloc::Layout;
use std::fmt;
use std::mem::{align_of, size_of};

/// Size in bytes of the native library's message struct (libzmq 4.x `zmq_msg_t`).
pub const MSG_SIZE: usize = 64;

/// Alignment the native library declares for its message struct.
pub const MSG_ALIGN: usize = 8;

/// The opaque message block the native library initializes and operates on.
///
/// The shim never interprets these bytes. Neither `Copy` nor `Clone`: the
/// native library forbids copying a message struct by value.
#[repr(C, align(8))]
pub struct RawMessage {
    pub opaque: [u8; MSG_SIZE],
}

// Binary compatibility with the native struct is decided at build time.
const _: () = assert!(size_of::<RawMessage>() == MSG_SIZE);
const _: () = assert!(align_of::<RawMessage>() == MSG_ALIGN);

impl Default for RawMessage {
    fn default() -> Self {
        Self {
            opaque: [0; MSG_SIZE],
        }
    }
}

impl fmt::Debug for RawMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_raw_message(self, f)
    }
}

/// Layout every allocator is asked for when creating one buffer.
pub const fn message_layout() -> Layout {
    Layout::new::<RawMessage>()
}

/// Check a foreign size/alignment pair against [`RawMessage`].
///
/// Used at the C boundary so the host can compare its own `sizeof` at startup.
pub fn layout_matches(size: usize, align: usize) -> bool {
    size == MSG_SIZE && align == MSG_ALIGN
}
