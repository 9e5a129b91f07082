//! Monotonic timestamps for the detection loop
//!
//! Timestamps count nanoseconds since the owning clock's origin. Only
//! differences between timestamps of the same clock are meaningful; they are
//! the software timers the polling loop compares against fixed intervals.

use core::fmt;
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Point in time relative to a clock origin, nanosecond resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Timestamp {
    nanos: u64,
}

impl Timestamp {
    /// The clock origin
    pub const ZERO: Timestamp = Timestamp { nanos: 0 };

    #[inline]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        Self {
            nanos: millis * 1_000_000,
        }
    }

    #[inline]
    pub const fn from_secs(secs: u64) -> Self {
        Self {
            nanos: secs * 1_000_000_000,
        }
    }

    #[inline]
    pub const fn as_nanos(&self) -> u64 {
        self.nanos
    }

    #[inline]
    pub const fn as_millis(&self) -> u64 {
        self.nanos / 1_000_000
    }

    #[inline]
    pub fn as_secs_f64(&self) -> f64 {
        self.nanos as f64 / 1_000_000_000.0
    }

    /// Time elapsed since `earlier`, zero if `earlier` is in the future
    #[inline]
    pub fn saturating_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_nanos(self.nanos.saturating_sub(earlier.nanos))
    }

    /// Shift this timestamp forward, saturating at the far future
    #[inline]
    pub fn saturating_add(&self, duration: Duration) -> Timestamp {
        let delta = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        Timestamp::from_nanos(self.nanos.saturating_add(delta))
    }
}

impl From<Duration> for Timestamp {
    fn from(offset: Duration) -> Self {
        Timestamp::ZERO.saturating_add(offset)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.nanos / 1_000_000_000;
        let millis = (self.nanos % 1_000_000_000) / 1_000_000;
        write!(f, "{}.{:03}s", secs, millis)
    }
}

/// Source of monotonic timestamps
pub trait Clock {
    /// Current time; never decreases between calls
    fn now(&self) -> Timestamp;
}

/// Wall-clock backed monotonic clock, origin at construction
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        Timestamp::from(self.origin.elapsed())
    }
}

/// Manually advanced clock for simulation and tests
///
/// Clones share the same underlying time, so a simulator and the loop driving
/// it observe the same instant.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            nanos: Rc::new(Cell::new(start.as_nanos())),
        }
    }

    pub fn advance(&self, step: Duration) {
        let next = Timestamp::from_nanos(self.nanos.get()).saturating_add(step);
        self.nanos.set(next.as_nanos());
    }

    /// Jump to `at`; ignored if it would move time backwards
    pub fn set(&self, at: Timestamp) {
        if at.as_nanos() > self.nanos.get() {
            self.nanos.set(at.as_nanos());
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_nanos(self.nanos.get())
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
