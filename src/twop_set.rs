use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::fmt;

use crate::error::{Error, Result};
use crate::{Crdt, DeltaCrdt, ReplicatedSet};

/// A two-phase set (2P-Set).
///
/// Elements can be added and removed, but once removed, they cannot be
/// re-added. This is implemented with two G-Sets: one for additions
/// and one for removals (tombstones).
///
/// A removal is recorded even for an element this replica has never seen.
/// Replicas exchange state in no particular order, so a remove can arrive
/// before its add; the tombstone still has to suppress that add later.
///
/// # Example
///
/// ```
/// use crdt_sets::prelude::*;
///
/// let mut s1 = TwoPSet::new();
/// s1.add("apple");
/// s1.add("banana");
/// s1.remove(&"banana");
///
/// assert!(s1.contains(&"apple"));
/// assert!(!s1.contains(&"banana")); // removed
///
/// let mut s2 = TwoPSet::new();
/// s2.add("banana"); // trying to re-add on another replica
///
/// s1.merge(&s2);
/// assert!(!s1.contains(&"banana")); // still removed (tombstone wins)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TwoPSet<T: Ord + Clone> {
    added: BTreeSet<T>,
    tombstones: BTreeSet<T>,
}

/// Delta for [`TwoPSet`]: the adds and tombstones the peer has not seen.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TwoPSetDelta<T: Ord + Clone> {
    added: BTreeSet<T>,
    tombstones: BTreeSet<T>,
}

impl<T: Ord + Clone> TwoPSetDelta<T> {
    /// Check if the delta carries nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.tombstones.is_empty()
    }
}

impl<T: Ord + Clone> TwoPSet<T> {
    /// Create a new empty 2P-Set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            added: BTreeSet::new(),
            tombstones: BTreeSet::new(),
        }
    }

    /// Rebuild a replica from raw components.
    ///
    /// Tombstones for elements missing from `added` are kept as they are.
    pub fn from_parts(
        added: impl IntoIterator<Item = T>,
        tombstones: impl IntoIterator<Item = T>,
    ) -> Self {
        Self {
            added: added.into_iter().collect(),
            tombstones: tombstones.into_iter().collect(),
        }
    }

    /// Rebuild a replica from raw components, requiring every tombstone to
    /// have a matching add.
    ///
    /// Use this for snapshots taken by a replica whose updates were delivered
    /// in causal order.
    ///
    /// ```
    /// use crdt_sets::{Error, TwoPSet};
    ///
    /// let ok = TwoPSet::try_from_parts(["a", "b"], ["a"]);
    /// assert!(ok.is_ok());
    ///
    /// let err = TwoPSet::try_from_parts(["a"], ["a", "z"]).unwrap_err();
    /// assert_eq!(err, Error::OrphanTombstones { count: 1 });
    /// ```
    pub fn try_from_parts(
        added: impl IntoIterator<Item = T>,
        tombstones: impl IntoIterator<Item = T>,
    ) -> Result<Self> {
        let set = Self::from_parts(added, tombstones);
        let count = set.tombstones.difference(&set.added).count();
        if count > 0 {
            return Err(Error::OrphanTombstones { count });
        }
        Ok(set)
    }

    /// Every element ever added, including those since removed.
    #[must_use]
    pub fn added(&self) -> BTreeSet<T> {
        self.added.clone()
    }

    /// Every element ever removed.
    ///
    /// Not necessarily a subset of [`added`](Self::added): a tombstone may
    /// be known before the add it cancels.
    #[must_use]
    pub fn tombstones(&self) -> BTreeSet<T> {
        self.tombstones.clone()
    }

    /// Check whether `value` has been tombstoned.
    #[must_use]
    pub fn is_tombstoned(&self, value: &T) -> bool {
        self.tombstones.contains(value)
    }

    /// Iterate over active elements (added and not removed).
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.added.difference(&self.tombstones)
    }
}

impl<T: Ord + Clone> ReplicatedSet<T> for TwoPSet<T> {
    /// Insert an element unless it has been tombstoned.
    ///
    /// Adding a tombstoned element is a permanent no-op.
    fn add(&mut self, value: T) -> bool {
        if self.tombstones.contains(&value) {
            tracing::debug!("add suppressed by tombstone");
            return false;
        }
        self.added.insert(value)
    }

    /// Tombstone an element, whether or not it was ever added.
    fn remove(&mut self, value: &T) -> bool {
        if !self.tombstones.contains(value) {
            self.tombstones.insert(value.clone());
        }
        true
    }

    fn clear(&mut self) -> bool {
        let present: Vec<T> = self.iter().cloned().collect();
        self.tombstones.extend(present);
        true
    }

    fn contains(&self, value: &T) -> bool {
        self.added.contains(value) && !self.tombstones.contains(value)
    }

    fn len(&self) -> usize {
        self.iter().count()
    }

    fn snapshot(&self) -> BTreeSet<T> {
        self.iter().cloned().collect()
    }
}

impl<T: Ord + Clone> Default for TwoPSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone> Crdt for TwoPSet<T> {
    fn merge(&mut self, other: &Self) {
        self.added.extend(other.added.iter().cloned());
        self.tombstones.extend(other.tombstones.iter().cloned());
        tracing::trace!(
            added = self.added.len(),
            tombstones = self.tombstones.len(),
            "merged 2p-set"
        );
    }
}

impl<T: Ord + Clone> DeltaCrdt for TwoPSet<T> {
    type Delta = TwoPSetDelta<T>;

    fn delta(&self, other: &Self) -> TwoPSetDelta<T> {
        TwoPSetDelta {
            added: self.added.difference(&other.added).cloned().collect(),
            tombstones: self
                .tombstones
                .difference(&other.tombstones)
                .cloned()
                .collect(),
        }
    }

    fn apply_delta(&mut self, delta: &TwoPSetDelta<T>) {
        self.added.extend(delta.added.iter().cloned());
        self.tombstones.extend(delta.tombstones.iter().cloned());
    }
}

impl<T: Ord + Clone> FromIterator<T> for TwoPSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_parts(iter, core::iter::empty())
    }
}

impl<T: Ord + Clone> fmt::Display for TwoPSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TwoPSet {{ added: {}, tombstones: {}, len: {} }}",
            self.added.len(),
            self.tombstones.len(),
            self.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::{String, ToString};
    use alloc::vec;

    #[test]
    fn new_set_is_empty() {
        let s = TwoPSet::<String>::new();
        assert!(s.is_empty());
        assert!(s.tombstones().is_empty());
    }

    #[test]
    fn add_and_contains() {
        let mut s = TwoPSet::new();
        s.add("a");
        assert!(s.contains(&"a"));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn duplicates_collapse() {
        let s: TwoPSet<&str> = ["a", "b", "b"].into_iter().collect();
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn remove_element() {
        let mut s = TwoPSet::new();
        s.add("a");
        assert!(s.remove(&"a"));
        assert!(!s.contains(&"a"));
        assert!(s.is_tombstoned(&"a"));
        assert_eq!(s.len(), 0);
    }

    #[test]
    fn cannot_readd_removed_element() {
        let mut s = TwoPSet::new();
        s.add("a");
        s.remove(&"a");
        assert!(!s.add("a"));
        assert!(!s.contains(&"a"));
    }

    #[test]
    fn remove_before_add_still_wins() {
        let mut s = TwoPSet::new();
        assert!(s.remove(&"a"));
        assert!(s.is_tombstoned(&"a"));
        assert!(!s.added().contains(&"a"));

        assert!(!s.add("a"));
        assert!(!s.contains(&"a"));
    }

    #[test]
    fn clear_tombstones_present_elements() {
        let mut s: TwoPSet<i32> = [1, 2, 3].into_iter().collect();
        assert!(s.clear());
        assert!(s.is_empty());
        assert_eq!(s.tombstones().len(), 3);
        assert!(!s.add(2));
    }

    #[test]
    fn remove_wins_on_merge() {
        let mut s1 = TwoPSet::new();
        s1.add("a");
        s1.remove(&"a");

        let mut s2 = TwoPSet::new();
        s2.add("a"); // concurrent add

        s1.merge(&s2);
        assert!(!s1.contains(&"a"));
    }

    #[test]
    fn orphan_tombstone_wins_in_either_order() {
        let mut a = TwoPSet::new();
        a.remove(&"a");

        let mut b = TwoPSet::new();
        b.add("a");

        let ab = a.merged(&b);
        let ba = b.merged(&a);
        assert!(!ab.contains(&"a"));
        assert!(!ba.contains(&"a"));
        assert!(ab.is_tombstoned(&"a"));
        assert_eq!(ab, ba);
    }

    #[test]
    fn merge_is_commutative() {
        let mut s1 = TwoPSet::new();
        s1.add("a");
        s1.add("b");
        s1.remove(&"a");

        let mut s2 = TwoPSet::new();
        s2.add("b");
        s2.add("c");

        assert_eq!(s1.merged(&s2), s2.merged(&s1));
    }

    #[test]
    fn merge_is_idempotent() {
        let mut s1 = TwoPSet::new();
        s1.add("a");

        let mut s2 = TwoPSet::new();
        s2.add("b");

        s1.merge(&s2);
        let after_first = s1.clone();
        s1.merge(&s2);

        assert_eq!(s1, after_first);
    }

    #[test]
    fn iterate_active_elements() {
        let mut s = TwoPSet::new();
        s.add(1);
        s.add(2);
        s.add(3);
        s.remove(&2);

        let active: Vec<&i32> = s.iter().collect();
        assert_eq!(active, vec![&1, &3]);
    }

    #[test]
    fn accessors_return_copies() {
        let mut s = TwoPSet::new();
        s.add("a");

        let mut added = s.added();
        added.insert("b");
        let mut snap = s.snapshot();
        snap.remove(&"a");

        assert!(!s.contains(&"b"));
        assert!(s.contains(&"a"));
    }

    #[test]
    fn strict_construction_rejects_orphans() {
        assert_eq!(
            TwoPSet::try_from_parts([1], [1, 2, 3]),
            Err(Error::OrphanTombstones { count: 2 })
        );
        let s = TwoPSet::try_from_parts([1, 2], [1]).unwrap();
        assert_eq!(s.snapshot().into_iter().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn lenient_construction_keeps_orphans() {
        let s = TwoPSet::from_parts([1], [2]);
        assert!(s.contains(&1));
        assert!(s.is_tombstoned(&2));
    }

    #[test]
    fn delta_carries_missing_components() {
        let mut a = TwoPSet::new();
        a.add("x");
        a.add("y");
        a.remove(&"y");

        let mut b = TwoPSet::new();
        b.add("x");

        let delta = a.delta(&b);
        assert!(!delta.is_empty());
        b.apply_delta(&delta);
        assert_eq!(b, a);
        assert!(a.delta(&b).is_empty());
    }

    #[test]
    fn display_reports_counts() {
        let s = TwoPSet::from_parts([1, 2, 3], [3, 4]);
        assert_eq!(s.to_string(), "TwoPSet { added: 3, tombstones: 2, len: 2 }");
    }
}
