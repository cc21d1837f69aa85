//! Time representation for timeline composition.
//!
//! The editing core works in integer milliseconds end to end; fractional
//! seconds exist only at the renderer boundary. Conversion must round-trip
//! ms -> s -> ms without drifting more than 1 ms for multi-hour durations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point or duration on the shared timeline, in milliseconds.
pub type TimelineMs = i64;

/// Convert a timeline value to fractional seconds for the renderer.
#[inline]
pub fn ms_to_secs(ms: TimelineMs) -> f64 {
    ms as f64 / 1000.0
}

/// Convert renderer seconds back to timeline milliseconds.
///
/// Rounds to the nearest millisecond; exact for any value produced by
/// [`ms_to_secs`] up to ~285,000 years (f64 holds integers up to 2^53).
#[inline]
pub fn secs_to_ms(secs: f64) -> TimelineMs {
    (secs * 1000.0).round() as TimelineMs
}

/// A half-open time range: inclusive start, exclusive end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSpan {
    /// Start time (inclusive)
    pub start: TimelineMs,
    /// Duration of the span
    pub duration: TimelineMs,
}

impl TimeSpan {
    /// Create a new span from start and duration.
    #[inline]
    pub fn new(start: TimelineMs, duration: TimelineMs) -> Self {
        Self { start, duration }
    }

    /// Create a span from start and end times.
    #[inline]
    pub fn from_start_end(start: TimelineMs, end: TimelineMs) -> Self {
        Self {
            start,
            duration: end - start,
        }
    }

    /// End time (exclusive).
    #[inline]
    pub fn end(self) -> TimelineMs {
        self.start + self.duration
    }

    /// Check if a time is within this span.
    #[inline]
    pub fn contains(self, time: TimelineMs) -> bool {
        time >= self.start && time < self.end()
    }

    /// Check if two spans overlap.
    pub fn overlaps(self, other: Self) -> bool {
        self.start < other.end() && other.start < self.end()
    }

    /// Compute the intersection of two spans, if any.
    pub fn intersection(self, other: Self) -> Option<Self> {
        if !self.overlaps(other) {
            return None;
        }
        let start = self.start.max(other.start);
        let end = self.end().min(other.end());
        Some(Self::from_start_end(start, end))
    }

    /// Check if this span has zero duration.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.duration <= 0
    }

    /// Empty span starting at zero.
    pub const EMPTY: Self = Self {
        start: 0,
        duration: 0,
    };
}

impl Default for TimeSpan {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}ms, {}ms)", self.start, self.end())
    }
}
