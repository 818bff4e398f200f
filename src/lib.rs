// Module naming follows project convention (Core = lifecycle primitives, Debug = formatting helpers)
#[allow(non_snake_case)]
pub mod Core;
#[allow(non_snake_case)]
pub mod Debug {
    pub mod StructDebug;
}
pub mod ffi;

// re-export for stable path
pub use crate::Core::{
    message_layout, layout_matches, BufferAllocator, BufferBuilder, Malloc, MessageBuffer,
    RawMessage, RustHeap, TrackingAllocator, MSG_ALIGN, MSG_SIZE,
};
