//! # crdt-sets
//!
//! State-based replicated sets that converge without coordination.
//!
//! Each replica mutates its own copy of a set. Later, replicas exchange full
//! snapshots (or deltas) and merge them. Merge is commutative, associative
//! and idempotent, so replicas that have seen the same updates hold the same
//! state no matter the order, duplication or delay of delivery.
//!
//! ## `no_std` Support
//!
//! This crate supports `no_std` environments with the `alloc` crate.
//! Disable the default `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! crdt-sets = { version = "0.1", default-features = false }
//! ```
//!
//! Note: [`clock::SystemClock`] requires the `std` feature.
//!
//! ## Quick Start
//!
//! ```
//! use crdt_sets::prelude::*;
//!
//! let mut alice = TwoPSet::new();
//! alice.add("milk");
//! alice.add("eggs");
//!
//! let mut bob = alice.clone();
//! bob.remove(&"milk");
//! alice.add("bread");
//!
//! alice.merge(&bob);
//! bob.merge(&alice);
//!
//! assert_eq!(alice, bob);
//! assert!(!alice.contains(&"milk"));
//! assert_eq!(alice.len(), 2);
//! ```
//!
//! ## Available Sets
//!
//! - [`GSet`] - Grow-only set (add only)
//! - [`TwoPSet`] - Two-phase set (add and remove, remove is permanent)
//! - [`LwwSet`] - Last-write-wins element set (timestamped add and remove,
//!   re-add allowed, remove wins ties)
//!
//! ## Traits
//!
//! All sets implement [`ReplicatedSet`] for local reads and writes, [`Crdt`]
//! for merging, and [`DeltaCrdt`] for shipping only what a peer is missing.
//!
//! ## Concurrency
//!
//! A replica is owned by one writer. Nothing in this crate locks; share a
//! replica across threads behind your own mutex or actor. Separate replicas
//! need no coordination at all.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

mod crdt;
mod error;
mod gset;
mod lww_set;
mod twop_set;

pub mod clock;
pub mod prelude;

pub use crdt::{Crdt, DeltaCrdt, ReplicatedSet};
pub use error::{Error, Result};
pub use gset::GSet;
pub use lww_set::{LwwSet, LwwSetDelta, Mutation};
pub use twop_set::{TwoPSet, TwoPSetDelta};
