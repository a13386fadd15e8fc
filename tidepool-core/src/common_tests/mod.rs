//! Shared test harnesses for `OrderedSet` implementations.
//!
//! The functions here are generic over the set type so every
//! synchronization discipline runs the same semantic checks. They are
//! public so downstream crates (e.g. the epoch-guarded integration tests)
//! can instantiate them too.
