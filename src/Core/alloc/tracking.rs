use super::{BufferAllocator, Malloc};
use crossbeam_utils::CachePadded;
use log::{trace, warn};
use parking_lot::Mutex;
use std::alloc::Layout;
use std::collections::HashSet;
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Allocator wrapper that records every block it hands out.
///
/// Stands in for the real allocator wherever buffer lifecycles need to be
/// observed: it knows which addresses are live, can refuse allocations past a
/// configured number of live blocks, and refuses to forward a release for an
/// address it never produced (the release is counted instead).
pub struct TrackingAllocator<A: BufferAllocator = Malloc> {
    pub(super) inner: A,
    pub(super) limit: Option<usize>,
    // Held across the inner allocation so the limit check and insert are one step.
    pub(super) live: Mutex<HashSet<usize>>,
    pub(super) allocations: CachePadded<AtomicU64>,
    pub(super) releases: CachePadded<AtomicU64>,
    pub(super) failures: CachePadded<AtomicU64>,
    pub(super) rejected: CachePadded<AtomicU64>,
}

impl Default for TrackingAllocator<Malloc> {
    fn default() -> Self {
        Self::new(Malloc)
    }
}

impl TrackingAllocator<Malloc> {
    /// An allocator that fails every request, for exercising exhaustion paths.
    pub fn exhausted() -> Self {
        Self::with_limit(Malloc, 0)
    }
}

impl<A: BufferAllocator> TrackingAllocator<A> {
    pub fn new(inner: A) -> Self {
        Self::build(inner, None)
    }

    /// Refuse allocations once `max_live` blocks are outstanding.
    pub fn with_limit(inner: A, max_live: usize) -> Self {
        Self::build(inner, Some(max_live))
    }

    fn build(inner: A, limit: Option<usize>) -> Self {
        Self {
            inner,
            limit,
            live: Mutex::new(HashSet::new()),
            allocations: CachePadded::new(AtomicU64::new(0)),
            releases: CachePadded::new(AtomicU64::new(0)),
            failures: CachePadded::new(AtomicU64::new(0)),
            rejected: CachePadded::new(AtomicU64::new(0)),
        }
    }

    fn track(&self, layout: Layout, f: impl FnOnce(&A, Layout) -> *mut u8) -> *mut u8 {
        let mut live = self.live.lock();

        if let Some(limit) = self.limit {
            if live.len() >= limit {
                self.failures.fetch_add(1, Ordering::Relaxed);
                trace!("TrackingAllocator: limit of {limit} live blocks reached");
                return ptr::null_mut();
            }
        }

        let ptr = f(&self.inner, layout);
        if ptr.is_null() {
            self.failures.fetch_add(1, Ordering::Relaxed);
            return ptr;
        }

        live.insert(ptr as usize);
        self.allocations.fetch_add(1, Ordering::Relaxed);
        ptr
    }
}

unsafe impl<A: BufferAllocator> BufferAllocator for TrackingAllocator<A> {
    fn allocate(&self, layout: Layout) -> *mut u8 {
        self.track(layout, |inner, layout| inner.allocate(layout))
    }

    fn allocate_zeroed(&self, layout: Layout) -> *mut u8 {
        self.track(layout, |inner, layout| inner.allocate_zeroed(layout))
    }

    unsafe fn release(&self, ptr: *mut u8, layout: Layout) {
        let mut live = self.live.lock();
        if !live.remove(&(ptr as usize)) {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            warn!("TrackingAllocator: release of unknown block {ptr:p} ignored");
            return;
        }
        self.inner.release(ptr, layout);
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    fn name(&self) -> &'static str {
        "tracking"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Core::alloc::RustHeap;
    use crate::Core::layout::{message_layout, RawMessage};

    #[test]
    fn counts_and_balances() {
        let tracker = TrackingAllocator::new(RustHeap);
        let layout = message_layout();

        let a = tracker.allocate(layout);
        let b = tracker.allocate_zeroed(layout);
        assert_eq!(tracker.live(), 2);

        unsafe {
            tracker.release(a, layout);
            tracker.release(b, layout);
        }
        assert_eq!(tracker.total_allocations(), 2);
        assert_eq!(tracker.total_releases(), 2);
        assert!(tracker.is_balanced());
    }

    #[test]
    fn limit_refuses_past_max_live() {
        let tracker = TrackingAllocator::with_limit(Malloc, 1);
        let layout = message_layout();

        let first = tracker.allocate(layout);
        assert!(!first.is_null());
        assert!(tracker.allocate(layout).is_null());
        assert_eq!(tracker.failed_allocations(), 1);

        unsafe { tracker.release(first, layout) };
        let again = tracker.allocate(layout);
        assert!(!again.is_null());
        unsafe { tracker.release(again, layout) };
    }

    #[test]
    fn unknown_release_is_rejected() {
        let tracker = TrackingAllocator::<Malloc>::default();
        let layout = message_layout();
        let mut foreign = RawMessage::default();

        unsafe { tracker.release(&mut foreign as *mut RawMessage as *mut u8, layout) };
        assert_eq!(tracker.rejected_releases(), 1);
        assert_eq!(tracker.total_releases(), 0);
    }

    #[test]
    fn exhausted_never_allocates() {
        let tracker = TrackingAllocator::exhausted();
        assert!(tracker.allocate(message_layout()).is_null());
        assert!(tracker.allocate_zeroed(message_layout()).is_null());
        assert_eq!(tracker.failed_allocations(), 2);
        assert_eq!(tracker.limit(), Some(0));
    }
}
