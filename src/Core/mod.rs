pub mod alloc;
pub mod buffer;
pub mod builder;
pub mod layout;

pub use alloc::{BufferAllocator, Malloc, RustHeap, TrackingAllocator};
pub use buffer::MessageBuffer;
pub use builder::BufferBuilder;
pub use layout::{message_layout, layout_matches, RawMessage, MSG_ALIGN, MSG_SIZE};
