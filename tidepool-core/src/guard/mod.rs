//! Guard trait for memory reclamation strategies.
//!
//! The lazy and lock-free lists unlink nodes that concurrent traversals may
//! still hold references into, so an unlinked node cannot be freed
//! immediately. Collections are generic over a `Guard` that decides when a
//! deferred node is actually destroyed:
//!
//! ```text
//! LazyList<T, G: Guard> / HarrisList<T, G: Guard>
//!     │
//!     ├── ...<T, EpochGuard>      (production, tidepool-crossbeam)
//!     └── ...<T, DeferredGuard>   (testing)
//! ```
//!
//! The hand-over-hand list takes no guard: a removed node's neighbors stay
//! locked through the unlink, so no concurrent reference into it can exist
//! and it is freed on the spot.

mod deferred_guard;

pub use deferred_guard::DeferredGuard;

/// A memory reclamation guard that protects concurrent access to nodes.
///
/// # Safety Contract
///
/// Implementations must ensure that a node passed to `defer_destroy` is not
/// freed while any read guard pinned before the call is still alive.
///
/// # Design Note
///
/// Guards are stored in collections and must be `Send + Sync`. The stored
/// instance only schedules deferred destruction; read-side protection comes
/// from pinning per operation via [`Guard::pin`].
pub trait Guard: Sized + Default + Send + Sync {
    /// An active guard that protects reads for its lifetime.
    ///
    /// For epoch-based guards this holds an actual pinned epoch guard. For
    /// deferred guards it can be `()` since protection comes from the
    /// collection's stored guard.
    type ReadGuard: Sized;

    /// Pin an active read guard.
    ///
    /// Every list operation pins before touching node pointers and holds
    /// the pin until it returns.
    fn pin() -> Self::ReadGuard;

    /// Schedule a node for deferred destruction.
    ///
    /// # Safety
    ///
    /// - `node` must be a valid pointer previously allocated by the
    ///   collection
    /// - `node` must be unlinked (not reachable by any new traversal)
    /// - `dealloc` must be the correct deallocation function for `node`
    /// - Must be called at most once per node
    unsafe fn defer_destroy<N>(&self, node: *mut N, dealloc: unsafe fn(*mut N));
}
