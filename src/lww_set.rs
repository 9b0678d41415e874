use alloc::collections::{BTreeMap, BTreeSet};
use core::fmt;

use crate::clock::{Clock, LogicalClock};
use crate::error::{Error, Result};
use crate::{Crdt, DeltaCrdt, ReplicatedSet};

/// The add and remove history of one element in an [`LwwSet`].
///
/// Each side holds the latest timestamp at which the element was added or
/// removed, or `None` if that never happened. `None` orders below every
/// timestamp, so the fresh record [`Mutation::NEVER`] loses to any real
/// mutation.
///
/// The element is present when its add time is strictly greater than its
/// remove time. Equal times, including the never/never record, mean absent.
///
/// ```
/// use crdt_sets::Mutation;
///
/// let a = Mutation::new(Some(1), Some(2));
/// let b = Mutation::new(Some(3), None);
///
/// let merged = a.merge(&b);
/// assert_eq!(merged, Mutation::new(Some(3), Some(2)));
/// assert!(merged.is_present());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mutation<Ts> {
    add: Option<Ts>,
    remove: Option<Ts>,
}

impl<Ts> Mutation<Ts> {
    /// A record for an element that was never added or removed.
    pub const NEVER: Self = Self {
        add: None,
        remove: None,
    };
}

impl<Ts: Ord + Copy> Mutation<Ts> {
    /// Build a record from raw add and remove times.
    #[must_use]
    pub fn new(add: Option<Ts>, remove: Option<Ts>) -> Self {
        Self { add, remove }
    }

    /// Latest add time, if the element was ever added.
    #[must_use]
    pub fn add_time(&self) -> Option<Ts> {
        self.add
    }

    /// Latest remove time, if the element was ever removed.
    #[must_use]
    pub fn remove_time(&self) -> Option<Ts> {
        self.remove
    }

    /// Whether the latest add strictly follows the latest remove.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.add > self.remove
    }

    /// Whether the element has been added at least once.
    #[must_use]
    pub fn has_been_added(&self) -> bool {
        self.add.is_some()
    }

    /// Whether the element has been removed at least once.
    #[must_use]
    pub fn has_been_removed(&self) -> bool {
        self.remove.is_some()
    }

    /// Whether this is the never/never record.
    #[must_use]
    pub fn is_never(&self) -> bool {
        self.add.is_none() && self.remove.is_none()
    }

    /// Combine two histories of the same element.
    ///
    /// Each side takes the later of the two times independently.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            add: self.add.max(other.add),
            remove: self.remove.max(other.remove),
        }
    }

    fn record_add(&mut self, ts: Ts) {
        self.add = self.add.max(Some(ts));
    }

    fn record_remove(&mut self, ts: Ts) {
        self.remove = self.remove.max(Some(ts));
    }

    fn dominates(&self, other: &Self) -> bool {
        self.merge(other) == *self
    }
}

impl<Ts> Default for Mutation<Ts> {
    fn default() -> Self {
        Self::NEVER
    }
}

/// A last-write-wins element set (LWW-Element-Set).
///
/// Every element carries a [`Mutation`] record with the latest add and
/// remove timestamps. An element is present while its latest add is newer
/// than its latest remove, so an element can be removed and added back any
/// number of times. When an add and a remove carry the same timestamp the
/// remove wins.
///
/// Local operations are stamped by the replica's own [`Clock`]. Merging
/// takes, per element, the later add time and the later remove time
/// separately, and never consults the clock.
///
/// # Example
///
/// ```
/// use crdt_sets::prelude::*;
///
/// let mut a = LwwSet::new();
/// a.add_at("x", 1);
/// a.remove_at(&"x", 2);
///
/// let mut b = LwwSet::new();
/// b.add_at("x", 3);
///
/// a.merge(&b);
/// assert!(a.contains(&"x")); // the add at 3 is newer than the remove at 2
/// assert_eq!(a.mutation(&"x"), Mutation::new(Some(3), Some(2)));
/// ```
#[derive(Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(bound(
        serialize = "T: serde::Serialize, C::Timestamp: serde::Serialize",
        deserialize = "T: serde::Deserialize<'de>, C: Default, C::Timestamp: serde::Deserialize<'de>"
    ))
)]
pub struct LwwSet<T: Ord + Clone, C: Clock = LogicalClock> {
    #[cfg_attr(feature = "serde", serde(skip))]
    clock: C,
    #[cfg_attr(feature = "serde", serde(deserialize_with = "deserialize_entries"))]
    entries: BTreeMap<T, Mutation<C::Timestamp>>,
}

/// Reads the record map and drops never/never records, which local
/// operations and merges never store.
#[cfg(feature = "serde")]
fn deserialize_entries<'de, D, T, Ts>(
    deserializer: D,
) -> core::result::Result<BTreeMap<T, Mutation<Ts>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de> + Ord,
    Ts: serde::Deserialize<'de> + Ord + Copy,
{
    let mut entries: BTreeMap<T, Mutation<Ts>> = serde::Deserialize::deserialize(deserializer)?;
    entries.retain(|_, record| !record.is_never());
    Ok(entries)
}

/// Delta for [`LwwSet`]: the records holding a time the peer has not seen.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LwwSetDelta<T: Ord + Clone, Ts> {
    entries: BTreeMap<T, Mutation<Ts>>,
}

impl<T: Ord + Clone, Ts> LwwSetDelta<T, Ts> {
    /// Number of records carried.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the delta carries nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Ord + Clone> LwwSet<T, LogicalClock> {
    /// Create a new empty set stamped by a [`LogicalClock`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(LogicalClock::new())
    }
}

impl<T: Ord + Clone, C: Clock> LwwSet<T, C> {
    /// Create a new empty set stamped by `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            entries: BTreeMap::new(),
        }
    }

    /// Rebuild a replica from raw `(element, record)` pairs.
    ///
    /// Duplicate elements are merged. Never/never records carry nothing and
    /// are dropped.
    pub fn from_mutations(
        clock: C,
        records: impl IntoIterator<Item = (T, Mutation<C::Timestamp>)>,
    ) -> Self {
        let mut set = Self::with_clock(clock);
        for (value, record) in records {
            set.merge_record(value, record);
        }
        set
    }

    /// Rebuild a replica from raw `(element, record)` pairs, rejecting
    /// never/never records.
    ///
    /// ```
    /// use crdt_sets::{Error, LwwSet, Mutation};
    /// use crdt_sets::clock::LogicalClock;
    ///
    /// let err = LwwSet::try_from_mutations(
    ///     LogicalClock::new(),
    ///     [("a", Mutation::new(Some(1), None)), ("b", Mutation::NEVER)],
    /// )
    /// .unwrap_err();
    /// assert!(matches!(err, Error::InvalidArgument(_)));
    /// ```
    pub fn try_from_mutations(
        clock: C,
        records: impl IntoIterator<Item = (T, Mutation<C::Timestamp>)>,
    ) -> Result<Self> {
        let mut set = Self::with_clock(clock);
        for (value, record) in records {
            if record.is_never() {
                return Err(Error::InvalidArgument(
                    "mutation record has neither an add nor a remove time",
                ));
            }
            set.merge_record(value, record);
        }
        Ok(set)
    }

    /// Record an add of `value` at `ts`.
    ///
    /// A timestamp older than the stored add time leaves the record
    /// unchanged. Returns `true` if the element became present.
    pub fn add_at(&mut self, value: T, ts: C::Timestamp) -> bool {
        let record = self.entries.entry(value).or_default();
        let was_present = record.is_present();
        record.record_add(ts);
        !was_present && record.is_present()
    }

    /// Record a remove of `value` at `ts`.
    ///
    /// The removal is stored even if `value` was never added, so it still
    /// outranks an older add that arrives later. Returns `true` if the
    /// element was present and no longer is.
    pub fn remove_at(&mut self, value: &T, ts: C::Timestamp) -> bool {
        let was_present = self.mutation(value).is_present();
        match self.entries.get_mut(value) {
            Some(record) => record.record_remove(ts),
            None => {
                self.entries.insert(value.clone(), Mutation::new(None, Some(ts)));
            }
        }
        was_present && !self.mutation(value).is_present()
    }

    /// The record for `value`, or [`Mutation::NEVER`] if it was never
    /// mutated.
    #[must_use]
    pub fn mutation(&self, value: &T) -> Mutation<C::Timestamp> {
        self.entries.get(value).copied().unwrap_or(Mutation::NEVER)
    }

    /// Iterate over every stored record, present or not.
    pub fn mutations(&self) -> impl Iterator<Item = (&T, &Mutation<C::Timestamp>)> {
        self.entries.iter()
    }

    /// Iterate over present elements in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries
            .iter()
            .filter(|(_, record)| record.is_present())
            .map(|(value, _)| value)
    }

    /// The clock stamping local operations.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Mutable access to the clock, e.g. to move it past a peer's times.
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    fn merge_record(&mut self, value: T, record: Mutation<C::Timestamp>) {
        if record.is_never() {
            return;
        }
        let mine = self.entries.entry(value).or_default();
        *mine = mine.merge(&record);
    }
}

impl<T: Ord + Clone, C: Clock> ReplicatedSet<T> for LwwSet<T, C> {
    fn add(&mut self, value: T) -> bool {
        let ts = self.clock.now();
        self.add_at(value, ts)
    }

    /// Record a removal at the current clock reading.
    ///
    /// Always returns `true`: the removal is stored even when the element
    /// is absent.
    fn remove(&mut self, value: &T) -> bool {
        let ts = self.clock.now();
        self.remove_at(value, ts);
        true
    }

    /// Remove every present element at a single clock reading.
    fn clear(&mut self) -> bool {
        let ts = self.clock.now();
        for record in self.entries.values_mut() {
            if record.is_present() {
                record.record_remove(ts);
            }
        }
        true
    }

    fn contains(&self, value: &T) -> bool {
        self.entries
            .get(value)
            .is_some_and(Mutation::is_present)
    }

    fn len(&self) -> usize {
        self.iter().count()
    }

    fn snapshot(&self) -> BTreeSet<T> {
        self.iter().cloned().collect()
    }
}

impl<T: Ord + Clone> Default for LwwSet<T, LogicalClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone, C: Clock> Crdt for LwwSet<T, C> {
    fn merge(&mut self, other: &Self) {
        for (value, theirs) in &other.entries {
            match self.entries.get_mut(value) {
                Some(mine) => *mine = mine.merge(theirs),
                None if theirs.is_never() => {}
                None => {
                    self.entries.insert(value.clone(), *theirs);
                }
            }
        }
        tracing::trace!(records = self.entries.len(), "merged lww-set");
    }
}

impl<T: Ord + Clone, C: Clock> DeltaCrdt for LwwSet<T, C> {
    type Delta = LwwSetDelta<T, C::Timestamp>;

    fn delta(&self, other: &Self) -> Self::Delta {
        let entries = self
            .entries
            .iter()
            .filter(|(value, mine)| !other.mutation(value).dominates(mine))
            .map(|(value, mine)| (value.clone(), *mine))
            .collect();
        LwwSetDelta { entries }
    }

    fn apply_delta(&mut self, delta: &Self::Delta) {
        for (value, record) in &delta.entries {
            self.merge_record(value.clone(), *record);
        }
    }
}

impl<T: Ord + Clone, C: Clock> PartialEq for LwwSet<T, C> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<T: Ord + Clone, C: Clock> Eq for LwwSet<T, C> {}

impl<T: Ord + Clone + fmt::Debug, C: Clock> fmt::Debug for LwwSet<T, C>
where
    C::Timestamp: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LwwSet")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl<T: Ord + Clone, C: Clock> fmt::Display for LwwSet<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LwwSet {{ records: {}, len: {} }}",
            self.entries.len(),
            self.len()
        )
    }
}
