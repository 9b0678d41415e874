use alloc::collections::BTreeSet;

/// Core trait that every replicated set implements.
///
/// A CRDT (Conflict-free Replicated Data Type) guarantees that concurrent
/// updates on different replicas will converge to the same state after merging,
/// without requiring coordination.
///
/// # Properties
///
/// All implementations must satisfy:
/// - **Commutativity:** `a.merge(b) == b.merge(a)`
/// - **Associativity:** `a.merge(b.merge(c)) == a.merge(b).merge(c)`
/// - **Idempotency:** `a.merge(a) == a`
/// - **Identity:** merging an empty replica leaves the state unchanged
pub trait Crdt {
    /// Merge another replica's state into this one.
    ///
    /// After merging, `self` contains the least upper bound of both states.
    /// `other` is only read.
    fn merge(&mut self, other: &Self);

    /// Return the merge of `self` and `other`, leaving both untouched.
    ///
    /// ```
    /// use crdt_sets::prelude::*;
    ///
    /// let a: GSet<u8> = [1, 2].into_iter().collect();
    /// let b: GSet<u8> = [2, 3].into_iter().collect();
    ///
    /// assert_eq!(a.merged(&b), b.merged(&a));
    /// assert_eq!(a.len(), 2);
    /// ```
    #[must_use]
    fn merged(&self, other: &Self) -> Self
    where
        Self: Clone,
    {
        let mut out = self.clone();
        out.merge(other);
        out
    }
}

/// Extension trait for delta-state CRDTs.
///
/// Delta-state CRDTs can produce compact deltas representing only the
/// changes between two states. Instead of shipping the full state, a
/// replica ships what the peer is missing.
///
/// # Example
///
/// ```
/// use crdt_sets::prelude::*;
///
/// let mut a = TwoPSet::new();
/// a.add("milk");
/// a.add("eggs");
///
/// let mut b = TwoPSet::new();
/// b.add("milk");
/// b.remove(&"milk");
///
/// let delta = a.delta(&b);
/// b.apply_delta(&delta);
///
/// assert!(b.contains(&"eggs"));
/// assert!(!b.contains(&"milk"));
/// ```
pub trait DeltaCrdt: Crdt {
    /// The type of delta produced by this CRDT.
    type Delta;

    /// Generate a delta containing changes in `self` that `other` does not have.
    fn delta(&self, other: &Self) -> Self::Delta;

    /// Apply a delta to this replica's state.
    ///
    /// Equivalent to merging the state that produced the delta.
    fn apply_delta(&mut self, delta: &Self::Delta);
}

/// The operation surface shared by every set variant.
///
/// Reads are pure functions of the current state. How a removal interacts
/// with later adds depends on the variant:
///
/// | variant    | `remove`          | re-add after remove |
/// |------------|-------------------|---------------------|
/// | [`GSet`]   | refused           | n/a                 |
/// | [`TwoPSet`]| permanent         | never               |
/// | [`LwwSet`] | timestamped       | if the add is later |
///
/// [`GSet`]: crate::GSet
/// [`TwoPSet`]: crate::TwoPSet
/// [`LwwSet`]: crate::LwwSet
pub trait ReplicatedSet<T: Ord + Clone> {
    /// Add an element.
    ///
    /// Returns `true` if the element was absent before the call and is
    /// present after it.
    fn add(&mut self, value: T) -> bool;

    /// Remove an element.
    ///
    /// Returns `true` if the variant recorded the removal.
    fn remove(&mut self, value: &T) -> bool;

    /// Remove every currently present element.
    ///
    /// Returns `true` if the variant supports clearing.
    fn clear(&mut self) -> bool;

    /// Check whether an element is currently present.
    fn contains(&self, value: &T) -> bool;

    /// Number of currently present elements.
    ///
    /// Always equal to `self.snapshot().len()`.
    fn len(&self) -> usize;

    /// Check if no element is present.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy out the currently present elements.
    ///
    /// The returned set is independent of `self`: changing either one
    /// does not affect the other.
    fn snapshot(&self) -> BTreeSet<T>;
}
