use super::*;
use std::fmt;

// Debug proxy implementations that call the standalone debug functions
impl<A: BufferAllocator> fmt::Debug for TrackingAllocator<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_tracking_allocator(self, f)
    }
}
