// Copyright 2026 the Event Timing Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host time in microsecond ticks.
//!
//! [`HostTime`] is a point on the page's monotonic clock (the timeline of
//! `performance.now()` and `Event.timeStamp`). Browsers report these as
//! fractional milliseconds; the pipeline stores them as whole microseconds so
//! that frame buckets can be keyed by exact timestamps and arithmetic stays
//! integral.
//!
//! [`Duration`] is a span in the same microsecond ticks. Subtraction between
//! host times saturates at zero: browsers do not guarantee that an event's
//! own timestamp precedes the moment its listener runs.

use core::fmt;
use core::ops::{Add, Sub};

const MICROS_PER_MILLI: f64 = 1000.0;

/// A point in time, in microseconds since the page's time origin.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// The time origin.
    pub const ZERO: Self = Self(0);

    /// Returns the raw microsecond value.
    #[inline]
    #[must_use]
    pub const fn micros(self) -> u64 {
        self.0
    }

    /// Converts a `DOMHighResTimeStamp` (milliseconds) to a [`HostTime`].
    ///
    /// Negative and non-finite inputs clamp to [`HostTime::ZERO`].
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "float-to-int casts saturate; page timestamps fit in u64 µs"
    )]
    pub fn from_millis(ms: f64) -> Self {
        Self((ms * MICROS_PER_MILLI) as u64)
    }

    /// Returns this time as fractional milliseconds.
    #[inline]
    #[must_use]
    pub fn as_millis(self) -> f64 {
        self.0 as f64 / MICROS_PER_MILLI
    }

    /// Returns the duration between `self` and an earlier time, or zero if
    /// `earlier` is after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }

    /// Saturating addition of a duration.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration.0))
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        self.saturating_add(rhs)
    }
}

impl Sub for HostTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Self) -> Duration {
        self.saturating_duration_since(rhs)
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({}µs)", self.0)
    }
}

/// A span of time in microseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// A zero-length duration.
    pub const ZERO: Self = Self(0);

    /// Creates a duration from whole milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis_u64(ms: u64) -> Self {
        Self(ms.saturating_mul(1000))
    }

    /// Creates a duration from fractional milliseconds, clamping negatives to
    /// zero.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "float-to-int casts saturate; durations fit in u64 µs"
    )]
    pub fn from_millis(ms: f64) -> Self {
        Self((ms * MICROS_PER_MILLI) as u64)
    }

    /// Returns the raw microsecond value.
    #[inline]
    #[must_use]
    pub const fn micros(self) -> u64 {
        self.0
    }

    /// Returns this duration as fractional milliseconds.
    #[inline]
    #[must_use]
    pub fn as_millis(self) -> f64 {
        self.0 as f64 / MICROS_PER_MILLI
    }

    /// Rounds to the nearest multiple of `step` (ties round up).
    ///
    /// A zero `step` returns `self` unchanged.
    #[inline]
    #[must_use]
    pub const fn round_to(self, step: Self) -> Self {
        if step.0 == 0 {
            return self;
        }
        let down = self.0 / step.0 * step.0;
        if self.0 - down >= step.0.div_ceil(2) {
            Self(down.saturating_add(step.0))
        } else {
            Self(down)
        }
    }

    /// Saturating addition.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Add for Duration {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl Sub for Duration {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.saturating_sub(rhs)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({}µs)", self.0)
    }
}
