/// Errors raised while building a replica from raw, externally supplied
/// state.
///
/// Local mutations and merges never fail; only the checked constructors
/// return this type. A failed construction has no side effects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A required input was missing or carried no information.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Tombstones were supplied for elements that were never added.
    #[error("invariant violated: {count} tombstone(s) without a matching add")]
    OrphanTombstones {
        /// Number of tombstones missing from the added component.
        count: usize,
    },
}

/// Result alias for fallible constructors.
pub type Result<T> = core::result::Result<T, Error>;
