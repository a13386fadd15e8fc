//! Concurrent ordered-set lists under three synchronization disciplines.
//!
//! - [`HandOverHandList`] - fine-grained lock-coupling (two adjacent
//!   per-node locks held throughout traversal)
//! - [`LazyList`] - optimistic synchronization (lock-free reads, locked
//!   and validated writes)
//! - [`HarrisList`] - lock-free (CAS on mark-tagged successor pointers)
//!
//! All three implement [`OrderedSet`] and are parameterized over the
//! memory-reclamation [`Guard`] where reclamation is deferred, and over the
//! per-node [`RawLock`] where nodes carry locks.

pub mod common_tests;
pub mod data_structures;
pub mod guard;
pub mod lock;

pub use data_structures::{HandOverHandList, HarrisList, LazyList, OrderedSet};
pub use guard::{DeferredGuard, Guard};
pub use lock::{RawLock, SpinLock, TicketLock};
