//! Clock abstraction traits.
//!
//! The engine never reads a clock on its own. Callers hand it instants from
//! whatever monotonic timer the platform offers (embassy, a HAL timer, or
//! `std::time::Instant` on a host) by implementing these traits.

/// Source of the current instant.
pub trait TimeSource<I: TimeInstant> {
    /// Returns the current time instant.
    fn now(&self) -> I;
}

/// Millisecond-resolution duration.
pub trait TimeDuration: Copy + PartialEq {
    /// Zero duration constant.
    const ZERO: Self;

    /// Converts duration to milliseconds.
    fn as_millis(&self) -> u64;

    /// Creates duration from milliseconds.
    fn from_millis(millis: u64) -> Self;

    /// Duration as fractional milliseconds, the unit all progress math uses.
    #[inline]
    fn as_millis_f32(&self) -> f32 {
        self.as_millis() as f32
    }

    /// Rounds a fractional millisecond span up to a whole duration.
    ///
    /// Negative and non-finite spans collapse to `ZERO`.
    fn from_millis_f32_ceil(millis: f32) -> Self {
        if millis.is_nan() || millis <= 0.0 {
            return Self::ZERO;
        }
        Self::from_millis(libm::ceilf(millis) as u64)
    }
}

/// A point on a monotonic clock.
pub trait TimeInstant: Copy {
    /// Duration type for this instant.
    type Duration: TimeDuration;

    /// Calculates duration since an earlier instant.
    fn duration_since(&self, earlier: Self) -> Self::Duration;

    /// Adds duration to instant, returns None on overflow.
    fn checked_add(self, duration: Self::Duration) -> Option<Self>;
}
