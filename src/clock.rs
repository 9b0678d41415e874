//! Time sources for [`LwwSet`](crate::LwwSet).
//!
//! The last-write-wins set never reads a global clock. Each replica is
//! handed a [`Clock`] at construction and stamps its own adds and removes
//! with it. A clock only has to be monotonic for the replica that owns it;
//! nothing here makes clocks of different replicas comparable.
//!
//! # Example
//!
//! ```
//! use crdt_sets::clock::{Clock, FnClock, LogicalClock};
//!
//! let mut clock = LogicalClock::new();
//! let t1 = clock.now();
//! let t2 = clock.now();
//! assert!(t2 > t1);
//!
//! // Any closure producing an ordered value works as a clock.
//! let mut ticks = 10u32;
//! let mut clock = FnClock::new(move || {
//!     ticks += 10;
//!     ticks
//! });
//! assert_eq!(clock.now(), 20);
//! ```

/// A per-replica source of ordered timestamps.
pub trait Clock {
    /// The timestamp type produced by this clock.
    type Timestamp: Ord + Copy;

    /// Produce a timestamp for a local event.
    ///
    /// Successive calls on one instance should not go backward.
    fn now(&mut self) -> Self::Timestamp;
}

/// A counter that advances by one on every reading.
///
/// The first reading is `1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogicalClock {
    last: u64,
}

impl LogicalClock {
    /// Create a clock that has not produced any timestamp yet.
    #[must_use]
    pub fn new() -> Self {
        Self { last: 0 }
    }

    /// Move the clock forward so the next reading exceeds `seen`.
    ///
    /// Has no effect if the clock is already past `seen`.
    pub fn observe(&mut self, seen: u64) {
        self.last = self.last.max(seen);
    }

    /// The last timestamp produced, or `0` if none.
    #[must_use]
    pub fn last(&self) -> u64 {
        self.last
    }
}

impl Clock for LogicalClock {
    type Timestamp = u64;

    fn now(&mut self) -> u64 {
        self.last = self.last.saturating_add(1);
        self.last
    }
}

/// Wall-clock time in microseconds since the Unix epoch.
///
/// Readings are forced to be strictly increasing per instance: if the
/// system clock stalls or steps back, the previous reading plus one is
/// returned instead.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    last: u64,
}

#[cfg(feature = "std")]
fn system_time_us() -> u64 {
    let elapsed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(feature = "std")]
impl SystemClock {
    /// Create a clock reading the system time.
    #[must_use]
    pub fn new() -> Self {
        Self { last: 0 }
    }
}

#[cfg(feature = "std")]
impl Clock for SystemClock {
    type Timestamp = u64;

    fn now(&mut self) -> u64 {
        let pt = system_time_us();
        self.last = if pt > self.last {
            pt
        } else {
            self.last.saturating_add(1)
        };
        self.last
    }
}

/// Adapts a closure into a [`Clock`].
///
/// This is the hook for plugging in an external time source, or a fixed
/// sequence of timestamps in tests.
#[derive(Clone)]
pub struct FnClock<F> {
    time_fn: F,
}

impl<F> FnClock<F> {
    /// Wrap `time_fn` as a clock.
    pub fn new(time_fn: F) -> Self {
        Self { time_fn }
    }
}

impl<F, Ts> Clock for FnClock<F>
where
    F: FnMut() -> Ts,
    Ts: Ord + Copy,
{
    type Timestamp = Ts;

    fn now(&mut self) -> Ts {
        (self.time_fn)()
    }
}

impl<F> core::fmt::Debug for FnClock<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FnClock").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use core::sync::atomic::{AtomicU64, Ordering};

    static MOCK_TIME: AtomicU64 = AtomicU64::new(1000);

    fn mock_time() -> u64 {
        MOCK_TIME.load(Ordering::SeqCst)
    }

    #[test]
    fn logical_clock_starts_at_one() {
        let mut clock = LogicalClock::new();
        assert_eq!(clock.last(), 0);
        assert_eq!(clock.now(), 1);
        assert_eq!(clock.now(), 2);
        assert_eq!(clock.last(), 2);
    }

    #[test]
    fn observe_jumps_forward_only() {
        let mut clock = LogicalClock::new();
        clock.observe(40);
        assert_eq!(clock.now(), 41);

        clock.observe(5);
        assert_eq!(clock.now(), 42);
    }

    #[cfg(feature = "std")]
    #[test]
    fn system_clock_is_strictly_monotonic() {
        let mut clock = SystemClock::new();
        let mut prev = clock.now();
        for _ in 0..1000 {
            let next = clock.now();
            assert!(next > prev);
            prev = next;
        }
    }

    #[cfg(feature = "std")]
    #[test]
    fn system_clock_reads_epoch_micros() {
        // 2020-09-13 in microseconds
        let floor = 1_600_000_000_000_000;
        let mut clock = SystemClock::new();
        let now = clock.now();
        assert!(now > floor);
        assert!(now < u64::MAX);
    }

    #[test]
    fn fn_clock_reads_time_source() {
        let mut clock = FnClock::new(mock_time as fn() -> u64);
        MOCK_TIME.store(5000, Ordering::SeqCst);
        assert_eq!(clock.now(), 5000);
    }

    #[test]
    fn fn_clock_accepts_stateful_closure() {
        let mut readings = vec![3, 7, 7].into_iter();
        let mut clock = FnClock::new(move || readings.next().unwrap_or(0));
        assert_eq!(clock.now(), 3);
        assert_eq!(clock.now(), 7);
        assert_eq!(clock.now(), 7);
        assert_eq!(clock.now(), 0);
    }
}
