use super::*;
use std::sync::atomic::Ordering;

/// Getter methods for TrackingAllocator
///
/// Counters are loaded with relaxed ordering; they are meant for assertions
/// and monitoring, not for synchronizing with other threads.
impl<A: BufferAllocator> TrackingAllocator<A> {
    /// Number of blocks handed out and not yet released
    pub fn live(&self) -> usize {
        self.live.lock().len()
    }

    /// Successful allocations since construction
    pub fn total_allocations(&self) -> u64 {
        self.allocations.load(Ordering::Relaxed)
    }

    /// Releases forwarded to the inner allocator
    pub fn total_releases(&self) -> u64 {
        self.releases.load(Ordering::Relaxed)
    }

    /// Requests refused by the limit or by the inner allocator
    pub fn failed_allocations(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Releases of addresses this allocator never produced (or already took back)
    pub fn rejected_releases(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// True when every allocation has been paired with exactly one release.
    pub fn is_balanced(&self) -> bool {
        self.live() == 0
            && self.total_allocations() == self.total_releases()
            && self.rejected_releases() == 0
    }
}
