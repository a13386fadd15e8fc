//! The three sorted-list variants.
//!
//! All hold the same shape - a head sentinel, zero or more data nodes in
//! strictly increasing key order, and a tail sentinel - and expose the same
//! [`OrderedSet`](crate::OrderedSet) operations. They differ in the
//! synchronization discipline that protects the chain.

pub mod hand_over_hand_list;
pub mod harris_list;
pub mod lazy_list;

pub use hand_over_hand_list::HandOverHandList;
pub use harris_list::HarrisList;
pub use lazy_list::LazyList;
