//! Crossbeam-based memory reclamation for tidepool collections.
//!
//! This crate provides `EpochGuard`, an implementation of the `Guard`
//! trait using crossbeam-epoch.
//!
//! # Usage
//!
//! ```ignore
//! use tidepool_core::{HarrisList, OrderedSet};
//! use tidepool_crossbeam::EpochGuard;
//!
//! let list: HarrisList<i32, EpochGuard> = HarrisList::new();
//! list.add(42);
//! ```

pub mod epoch_guard;

pub use epoch_guard::EpochGuard;
