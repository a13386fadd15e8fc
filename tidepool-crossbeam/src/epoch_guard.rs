//! Epoch-based guard implementation using crossbeam-epoch.
//!
//! # Design
//!
//! `EpochGuard` is a zero-sized type: all state lives in the global epoch
//! collector. Collections parameterized with it get epoch-based memory
//! reclamation:
//!
//! ```text
//! HarrisList<i32, EpochGuard>
//! LazyList<i32, EpochGuard>
//! ```
//!
//! Every list operation pins the current thread for its duration, so a
//! node deferred while any such pin is active is not freed until all
//! pinned threads have advanced past that epoch.

use crossbeam_epoch::{self as epoch, Guard as CrossbeamGuard};
use tidepool_core::guard::Guard;

/// Epoch-based memory reclamation guard.
///
/// Unlike `DeferredGuard`, which accumulates nodes until the collection
/// drops, `EpochGuard` hands unlinked nodes to the global crossbeam-epoch
/// collector, which frees them once no thread can still observe them.
///
/// # Performance
///
/// - **Pin overhead**: very low (thread-local check)
/// - **Reclamation**: batched, amortized O(1) per node
/// - **Memory**: bounded by epoch advancement, not collection lifetime
#[derive(Clone, Copy, Default)]
pub struct EpochGuard {
    // Zero-sized - all state is in the global epoch collector
}

impl EpochGuard {
    pub fn new() -> Self {
        EpochGuard {}
    }
}

impl Guard for EpochGuard {
    /// An actual pinned crossbeam guard that protects reads for its
    /// lifetime.
    type ReadGuard = CrossbeamGuard;

    fn pin() -> Self::ReadGuard {
        epoch::pin()
    }

    unsafe fn defer_destroy<N>(&self, node: *mut N, dealloc: unsafe fn(*mut N)) {
        // Pin, schedule, unpin: destruction runs after all threads have
        // advanced past the current epoch.
        let guard = epoch::pin();
        unsafe {
            guard.defer_unchecked(move || {
                dealloc(node);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_guard_basic() {
        let guard = EpochGuard::default();

        let boxed = Box::new(42i32);
        let ptr = Box::into_raw(boxed);

        unsafe {
            guard.defer_destroy(ptr, |p| {
                drop(Box::from_raw(p));
            });
        }

        // Node scheduled for reclamation via the global epoch collector.
    }

    #[test]
    fn test_multiple_deferred() {
        let guard = EpochGuard::default();

        let ptr1 = Box::into_raw(Box::new(1i32));
        let ptr2 = Box::into_raw(Box::new(2i32));

        unsafe {
            guard.defer_destroy(ptr1, |p| drop(Box::from_raw(p)));
            guard.defer_destroy(ptr2, |p| drop(Box::from_raw(p)));
        }
    }
}
