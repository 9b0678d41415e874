//! Convenient re-exports for common usage.
//!
//! ```
//! use crdt_sets::prelude::*;
//! ```

pub use crate::clock::{Clock, LogicalClock};
pub use crate::Crdt;
pub use crate::DeltaCrdt;
pub use crate::GSet;
pub use crate::LwwSet;
pub use crate::Mutation;
pub use crate::ReplicatedSet;
pub use crate::TwoPSet;
