use std::fmt;
use crate::Core::alloc::{BufferAllocator, TrackingAllocator};
use crate::Core::buffer::MessageBuffer;
use crate::Core::layout::{RawMessage, MSG_ALIGN, MSG_SIZE};

/// Debug function for MessageBuffer
///
/// Shows the block address and the allocator that owns it. The contents are
/// never read: a freshly created buffer is uninitialized memory.
pub fn debug_message_buffer<A: BufferAllocator>(
    buffer: &MessageBuffer<A>,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    f.debug_struct("MessageBuffer")
        .field("ptr", &format_args!("{:p}", buffer.as_ptr()))
        .field("size", &MSG_SIZE)
        .field("allocator", &buffer.allocator().name())
        .finish()
}

/// Debug function for RawMessage
pub fn debug_raw_message(_msg: &RawMessage, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RawMessage")
        .field("size", &MSG_SIZE)
        .field("align", &MSG_ALIGN)
        .finish_non_exhaustive()
}

/// Debug function for TrackingAllocator
///
/// Shows:
/// - Inner allocator name
/// - Live block count and optional limit
/// - Allocation, release, failure and rejection counters
pub fn debug_tracking_allocator<A: BufferAllocator>(
    allocator: &TrackingAllocator<A>,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    f.debug_struct("TrackingAllocator")
        .field("inner", &allocator.inner().name())
        .field("live", &allocator.live())
        .field("limit", &allocator.limit())
        .field("allocations", &allocator.total_allocations())
        .field("releases", &allocator.total_releases())
        .field("failures", &allocator.failed_allocations())
        .field("rejected", &allocator.rejected_releases())
        .finish()
}
