// Copyright (c) 2026 the dnp3-outstation authors. Licensed under Apache License, Version 2.0.

//! Monotonic time as the core sees it. See [`MonotonicTimestamp`].

use std::sync::OnceLock;
use std::time::Instant;

/// Milliseconds since an abstract steady clock epoch.
///
/// Most of the core never reads the wall clock directly - timestamps flow
/// in through [`crate::context::OutstationContext`] method arguments so
/// that tests can fix or advance time deterministically. The executor
/// strand is the one place a real clock is sampled, via [`Self::now`].
/// Two timestamps from different clock epochs are not comparable; the type
/// carries no epoch information on purpose; do not serialize one and
/// compare it against a value produced by a different process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonotonicTimestamp(u64);

static EPOCH: OnceLock<Instant> = OnceLock::new();

impl MonotonicTimestamp {
    /// Wraps a raw millisecond count.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self { Self(millis) }

    /// Samples the process-wide steady clock, relative to a fixed epoch
    /// established on first use.
    #[must_use]
    pub fn now() -> Self {
        let epoch = EPOCH.get_or_init(Instant::now);
        Self(Instant::now().saturating_duration_since(*epoch).as_millis() as u64)
    }

    /// Returns the millisecond count.
    #[must_use]
    pub const fn as_millis(self) -> u64 { self.0 }

    /// Returns `self + millis`, saturating instead of overflowing.
    #[must_use]
    pub const fn checked_add(self, millis: u64) -> Self { Self(self.0.saturating_add(millis)) }

    /// Returns `true` if `self` is at or past `deadline`.
    #[must_use]
    pub fn has_elapsed(self, deadline: Self) -> bool { self >= deadline }

    /// Milliseconds between two timestamps, saturating at zero if `earlier`
    /// is actually later than `self` - callers compare timestamps from the
    /// same monotonic source, so this only happens if the caller passed
    /// them in the wrong order.
    #[must_use]
    pub const fn duration_since(self, earlier: Self) -> u64 { self.0.saturating_sub(earlier.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_add_saturates() {
        let t = MonotonicTimestamp::from_millis(u64::MAX - 1);
        let later = t.checked_add(10);
        assert_eq!(later.as_millis(), u64::MAX);
    }

    #[test]
    fn has_elapsed_is_inclusive() {
        let t = MonotonicTimestamp::from_millis(100);
        assert!(t.has_elapsed(MonotonicTimestamp::from_millis(100)));
        assert!(t.has_elapsed(MonotonicTimestamp::from_millis(99)));
        assert!(!t.has_elapsed(MonotonicTimestamp::from_millis(101)));
    }

    #[test]
    fn duration_since_never_goes_negative() {
        let earlier = MonotonicTimestamp::from_millis(50);
        let later = MonotonicTimestamp::from_millis(10);
        assert_eq!(later.duration_since(earlier), 0);
    }

    #[test]
    fn now_is_monotonic_non_decreasing() {
        let a = MonotonicTimestamp::now();
        let b = MonotonicTimestamp::now();
        assert!(b >= a);
    }
}
