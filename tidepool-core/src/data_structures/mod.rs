//! Concurrent ordered-set data structures.
//!
//! # Organization
//!
//! - [`sorted`] - the three list variants
//! - [`internal`] - the shared `OrderedSet` trait and the mark-tagged
//!   pointer (pub(crate))

pub(crate) mod internal;
pub mod sorted;

pub use sorted::{HandOverHandList, HarrisList, LazyList};

pub(crate) use internal::MarkedPtr;
pub use internal::OrderedSet;
