use crate::Core::alloc::{BufferAllocator, Malloc};
use crate::Core::buffer::MessageBuffer;
use std::io;

/// Configuration for creating message buffers: allocator and zero-fill.
pub struct BufferBuilder<A: BufferAllocator = Malloc> {
    allocator: A,
    zeroed: bool,
}

impl Default for BufferBuilder<Malloc> {
    fn default() -> Self {
        Self {
            allocator: Malloc,
            zeroed: false, // native init overwrites the block anyway
        }
    }
}

impl BufferBuilder<Malloc> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<A: BufferAllocator> BufferBuilder<A> {
    /// Zero-fill new buffers instead of leaving them uninitialized.
    pub fn zeroed(mut self, zeroed: bool) -> Self {
        self.zeroed = zeroed;
        self
    }

    /// Switch to another allocator, keeping the other settings.
    pub fn with_allocator<B: BufferAllocator>(self, allocator: B) -> BufferBuilder<B> {
        BufferBuilder {
            allocator,
            zeroed: self.zeroed,
        }
    }

    pub fn is_zeroed(&self) -> bool {
        self.zeroed
    }

    /// Create one buffer with the current settings.
    pub fn build(&self) -> io::Result<MessageBuffer<A>>
    where
        A: Clone,
    {
        MessageBuffer::allocate(self.allocator.clone(), self.zeroed)
    }

    /// Build a buffer, hand it to `f`, and release it when `f` returns or unwinds.
    pub fn scoped<R>(&self, f: impl FnOnce(&mut MessageBuffer<A>) -> R) -> io::Result<R>
    where
        A: Clone,
    {
        let mut buffer = self.build()?;
        Ok(f(&mut buffer))
    }
}
