use alloc::collections::BTreeSet;
use core::fmt;

use crate::{Crdt, DeltaCrdt, ReplicatedSet};

/// A grow-only set (G-Set).
///
/// Elements can be added but never removed. Merge is simply the union
/// of both sets. This is the simplest set CRDT.
///
/// # Example
///
/// ```
/// use crdt_sets::prelude::*;
///
/// let mut s1 = GSet::new();
/// s1.add("apple");
/// s1.add("banana");
///
/// let mut s2 = GSet::new();
/// s2.add("cherry");
///
/// s1.merge(&s2);
/// assert_eq!(s1.len(), 3);
/// assert!(s1.contains(&"cherry"));
/// assert!(!s1.remove(&"apple")); // removal is refused
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GSet<T: Ord + Clone> {
    elements: BTreeSet<T>,
}

impl<T: Ord + Clone> GSet<T> {
    /// Create a new empty G-Set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            elements: BTreeSet::new(),
        }
    }

    /// Iterate over the elements in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.elements.iter()
    }
}

impl<T: Ord + Clone> ReplicatedSet<T> for GSet<T> {
    fn add(&mut self, value: T) -> bool {
        self.elements.insert(value)
    }

    fn remove(&mut self, _value: &T) -> bool {
        tracing::debug!("g-set refuses remove");
        false
    }

    fn clear(&mut self) -> bool {
        tracing::debug!(len = self.elements.len(), "g-set refuses clear");
        false
    }

    fn contains(&self, value: &T) -> bool {
        self.elements.contains(value)
    }

    fn len(&self) -> usize {
        self.elements.len()
    }

    fn snapshot(&self) -> BTreeSet<T> {
        self.elements.clone()
    }
}

impl<T: Ord + Clone> Default for GSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone> Crdt for GSet<T> {
    fn merge(&mut self, other: &Self) {
        for elem in &other.elements {
            if !self.elements.contains(elem) {
                self.elements.insert(elem.clone());
            }
        }
        tracing::trace!(len = self.elements.len(), "merged g-set");
    }
}

impl<T: Ord + Clone> DeltaCrdt for GSet<T> {
    type Delta = GSet<T>;

    fn delta(&self, other: &Self) -> GSet<T> {
        self.elements
            .difference(&other.elements)
            .cloned()
            .collect()
    }

    fn apply_delta(&mut self, delta: &GSet<T>) {
        self.merge(delta);
    }
}

impl<T: Ord + Clone> IntoIterator for GSet<T> {
    type Item = T;
    type IntoIter = alloc::collections::btree_set::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<T: Ord + Clone> FromIterator<T> for GSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            elements: BTreeSet::from_iter(iter),
        }
    }
}

impl<T: Ord + Clone> Extend<T> for GSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.elements.extend(iter);
    }
}

impl<T: Ord + Clone> fmt::Display for GSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GSet {{ len: {} }}", self.elements.len())
    }
}
