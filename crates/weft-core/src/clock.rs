//! Logical clock used to order and deduplicate graph computation.
//!
//! A [`Clock`] is a tick count plus a sub-tick fraction. One second is
//! [`Clock::TICKS`] ticks, so a tick is a microsecond. The fraction carries
//! the remainder that sample-rate arithmetic leaves behind, which keeps block
//! boundaries exact over long runs.

use core::cmp::Ordering;
use core::fmt;
use core::ops::{Add, AddAssign, Sub, SubAssign};

/// Immutable timestamp: `ticks + fraction`, with `fraction` in `[0, 1)`.
///
/// The infinite clock ([`Clock::MAX`]) stores a fraction of `+inf` and zero
/// ticks. It compares greater than every finite clock and equal to itself.
#[derive(Clone, Copy)]
pub struct Clock {
    ticks: i64,
    fraction: f64,
}

impl Clock {
    /// Ticks per second.
    pub const TICKS: f64 = 1_000_000.0;

    pub const ZERO: Clock = Clock {
        ticks: 0,
        fraction: 0.0,
    };

    /// The infinite clock. Static nodes use it as their next render time.
    pub const MAX: Clock = Clock {
        ticks: 0,
        fraction: f64::INFINITY,
    };

    pub fn new(ticks: i64, fraction: f64) -> Self {
        let mut clock = Self::from_ticks(ticks);
        clock += fraction;
        clock
    }

    pub const fn from_ticks(ticks: i64) -> Self {
        Self {
            ticks,
            fraction: 0.0,
        }
    }

    pub fn from_value(value: f64) -> Self {
        Self::ZERO + value
    }

    pub fn from_seconds(seconds: f64) -> Self {
        Self::from_value(seconds * Self::TICKS)
    }

    /// Clock at `samples` into a stream running at `sample_rate`.
    pub fn from_samples(samples: f64, sample_rate: f64) -> Self {
        Self::from_value(Self::ticks_for_samples(samples, sample_rate))
    }

    /// Duration in ticks of `samples` at `sample_rate`.
    #[inline]
    pub fn ticks_for_samples(samples: f64, sample_rate: f64) -> f64 {
        samples * Self::TICKS / sample_rate
    }

    #[inline]
    pub fn ticks(&self) -> i64 {
        self.ticks
    }

    #[inline]
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    #[inline]
    pub fn is_infinite(&self) -> bool {
        self.fraction.is_infinite()
    }

    /// Total value in ticks.
    ///
    /// Very large tick counts lose integer precision when widened to `f64`;
    /// debug builds catch that here.
    pub fn value(&self) -> f64 {
        if self.is_infinite() {
            return f64::INFINITY;
        }

        let ticks = self.ticks as f64;
        debug_assert!(
            (ticks + 1.0) - ticks == 1.0,
            "clock lost integer precision at {} ticks",
            self.ticks
        );

        ticks + self.fraction
    }

    pub fn to_seconds(&self) -> f64 {
        self.value() / Self::TICKS
    }

    pub fn to_samples(&self, sample_rate: f64) -> f64 {
        self.value() * sample_rate / Self::TICKS
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self.is_infinite(), other.is_infinite()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self
                .ticks
                .cmp(&other.ticks)
                .then_with(|| self.fraction.total_cmp(&other.fraction)),
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_infinite() {
            return f.write_str("Clock(inf)");
        }
        write!(f, "Clock({} + {})", self.ticks, self.fraction)
    }
}

impl fmt::Display for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_infinite() {
            return f.write_str("inf");
        }
        write!(f, "{:.3}s", self.to_seconds())
    }
}

impl PartialEq for Clock {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

// Fractions are never NaN once normalised, so the order is total.
impl Eq for Clock {}

impl PartialOrd for Clock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Clock {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl AddAssign<f64> for Clock {
    fn add_assign(&mut self, offset: f64) {
        if offset.is_infinite() || self.is_infinite() {
            *self = Self::MAX;
            return;
        }

        let corrected = offset + self.fraction;
        let whole = corrected.trunc();
        self.ticks += whole as i64;
        self.fraction = corrected - whole;

        if self.fraction < 0.0 {
            self.ticks -= 1;
            self.fraction += 1.0;
        }

        // -epsilon + 1.0 can round up to exactly 1.0
        if self.fraction >= 1.0 {
            self.ticks += 1;
            self.fraction -= 1.0;
        }
    }
}

impl SubAssign<f64> for Clock {
    fn sub_assign(&mut self, offset: f64) {
        *self += -offset;
    }
}

impl Add<f64> for Clock {
    type Output = Clock;

    fn add(mut self, offset: f64) -> Clock {
        self += offset;
        self
    }
}

impl Sub<f64> for Clock {
    type Output = Clock;

    fn sub(mut self, offset: f64) -> Clock {
        self -= offset;
        self
    }
}

impl AddAssign<Clock> for Clock {
    fn add_assign(&mut self, other: Clock) {
        if self.is_infinite() || other.is_infinite() {
            *self = Self::MAX;
            return;
        }
        self.ticks += other.ticks;
        *self += other.fraction;
    }
}

impl Add<Clock> for Clock {
    type Output = Clock;

    fn add(mut self, other: Clock) -> Clock {
        self += other;
        self
    }
}

impl SubAssign<Clock> for Clock {
    fn sub_assign(&mut self, other: Clock) {
        if self.is_infinite() {
            return;
        }
        debug_assert!(
            !other.is_infinite(),
            "cannot subtract an infinite clock from {self:?}"
        );
        self.ticks -= other.ticks;
        *self -= other.fraction;
    }
}

impl Sub<Clock> for Clock {
    type Output = Clock;

    fn sub(mut self, other: Clock) -> Clock {
        self -= other;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_carry_into_ticks() {
        let clock = Clock::new(10, 0.75) + 0.5;
        assert_eq!(clock.ticks(), 11);
        assert_relative_eq!(clock.fraction(), 0.25);
    }

    #[test]
    fn test_negative_offset_borrows() {
        let clock = Clock::new(10, 0.25) - 0.5;
        assert_eq!(clock.ticks(), 9);
        assert_relative_eq!(clock.fraction(), 0.75);
    }

    #[test]
    fn test_infinite_is_latest() {
        let far = Clock::from_ticks(i64::MAX / 2);
        assert!(Clock::MAX > far);
        assert!(Clock::MAX >= Clock::MAX);
        assert_eq!(Clock::MAX, Clock::MAX);
        assert!(far < Clock::MAX);
        assert!((far + f64::INFINITY).is_infinite());
        assert!((Clock::MAX + 1.0).is_infinite());
    }

    #[test]
    fn test_clock_subtraction() {
        let a = Clock::new(100, 0.25);
        let b = Clock::new(40, 0.5);
        let diff = a - b;
        assert_eq!(diff.ticks(), 59);
        assert_relative_eq!(diff.fraction(), 0.75);
        assert!((Clock::MAX - a).is_infinite());
    }

    #[test]
    fn test_samples_conversion() {
        let clock = Clock::from_samples(44100.0, 44100.0);
        assert_eq!(clock.ticks(), 1_000_000);
        assert_relative_eq!(clock.to_samples(44100.0), 44100.0, epsilon = 1e-9);
        assert_relative_eq!(clock.to_seconds(), 1.0);
    }

    #[test]
    fn test_block_steps_stay_exact() {
        // 64 samples at 44.1kHz is not a whole number of ticks
        let step = Clock::ticks_for_samples(64.0, 44100.0);
        let mut clock = Clock::ZERO;
        for _ in 0..44100 {
            clock += step;
        }
        assert_relative_eq!(clock.to_samples(44100.0), 64.0 * 44100.0, epsilon = 1e-3);
    }

    proptest! {
        #[test]
        fn prop_fraction_stays_normalised(
            ticks in -1_000_000_000i64..1_000_000_000,
            offset in -1.0e9f64..1.0e9,
        ) {
            let clock = Clock::from_ticks(ticks) + offset;
            prop_assert!(clock.fraction() >= 0.0);
            prop_assert!(clock.fraction() < 1.0);
        }

        #[test]
        fn prop_order_matches_value(
            a in -1.0e9f64..1.0e9,
            b in -1.0e9f64..1.0e9,
        ) {
            let (ca, cb) = (Clock::from_value(a), Clock::from_value(b));
            if a < b {
                prop_assert!(ca <= cb);
            } else if a > b {
                prop_assert!(ca >= cb);
            }
        }

        #[test]
        fn prop_offset_round_trip(
            start in -1.0e6f64..1.0e6,
            offset in -1.0e6f64..1.0e6,
        ) {
            let clock = Clock::from_value(start);
            let back = (clock + offset) - offset;
            prop_assert!((back.value() - clock.value()).abs() < 1e-6);
        }
    }
}
