//! Rate negotiation values: block size, sample rate and overlap.
//!
//! Each is a shared handle around an atomic cell. Nodes that were built from
//! the same input share one handle, so a change made from the control thread
//! is seen by all of them. Every `set` bumps a generation counter that
//! dependents poll to learn about the change (busses resize on it).

use crate::lockfree::{Atom, AtomicValue};
use crate::{Clock, Error, Result};
use std::fmt;
use std::sync::{Arc, OnceLock};

struct Shared<T: Atom> {
    value: AtomicValue<T>,
    generation: AtomicValue<u32>,
}

/// Shared, observable scalar.
pub struct RateValue<T: Atom> {
    inner: Arc<Shared<T>>,
}

impl<T: Atom> RateValue<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Shared {
                value: AtomicValue::new(value),
                generation: AtomicValue::new(0),
            }),
        }
    }

    #[inline]
    pub fn get(&self) -> T {
        self.inner.value.get()
    }

    /// Stores `value` and notifies every holder of this handle.
    pub fn set(&self, value: T) {
        self.inner.value.set(value);
        self.inner.generation.increment();
    }

    /// Bumped once per `set`.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.inner.generation.get()
    }

    /// True when both handles share one cell.
    #[inline]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Atom> Clone for RateValue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Atom> fmt::Debug for RateValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.get(), f)
    }
}

macro_rules! rate_handle {
    ($name:ident, $ty:ty) => {
        impl $name {
            #[inline]
            pub fn get(&self) -> $ty {
                self.0.get()
            }

            #[inline]
            pub fn set(&self, value: $ty) {
                self.0.set(value);
            }

            #[inline]
            pub fn generation(&self) -> u32 {
                self.0.generation()
            }

            #[inline]
            pub fn same_as(&self, other: &Self) -> bool {
                self.0.same_as(&other.0)
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.get() == other.get()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.get()).finish()
            }
        }
    };
}

/// Samples per render block.
#[derive(Clone)]
pub struct BlockSize(RateValue<usize>);

rate_handle!(BlockSize, usize);

impl BlockSize {
    pub const DEFAULT: usize = 512;
    const NO_PREFERENCE: usize = 0;

    pub fn new(size: usize) -> Self {
        Self(RateValue::new(size))
    }

    /// Sentinel meaning "take the block size of my inputs".
    pub fn no_preference() -> Self {
        Self::new(Self::NO_PREFERENCE)
    }

    #[inline]
    pub fn is_no_preference(&self) -> bool {
        self.get() == Self::NO_PREFERENCE
    }

    /// Process-wide default, shared by every node that did not ask for
    /// something else.
    pub fn default_size() -> Self {
        static DEFAULT: OnceLock<BlockSize> = OnceLock::new();
        DEFAULT
            .get_or_init(|| BlockSize::new(Self::DEFAULT))
            .clone()
    }

    pub fn set_default(size: usize) -> Result<()> {
        if size == Self::NO_PREFERENCE {
            return Err(Error::InvalidBlockSize(size));
        }

        let default = Self::default_size();
        if default.get() != size {
            default.set(size);
            tracing::info!("Default block size set to {}", size);
        }
        Ok(())
    }

    /// Block size of control-rate nodes: one sample per block.
    pub fn control_rate() -> Self {
        static CONTROL: OnceLock<BlockSize> = OnceLock::new();
        CONTROL.get_or_init(|| BlockSize::new(1)).clone()
    }

    /// Default size divided by `divisor`, at least 1.
    pub fn fraction_of_default(divisor: usize) -> Self {
        debug_assert!(divisor > 0);
        Self::new((Self::default_size().get() / divisor.max(1)).max(1))
    }

    pub fn multiple_of_default(multiple: usize) -> Self {
        Self::new(Self::default_size().get() * multiple.max(1))
    }

    /// `preferred` unless it is the no-preference sentinel, else `input`.
    /// Falls back to the default when neither says anything.
    pub fn decide(input: &BlockSize, preferred: &BlockSize) -> BlockSize {
        let chosen = if preferred.is_no_preference() {
            input
        } else {
            preferred
        };

        if chosen.is_no_preference() {
            Self::default_size()
        } else {
            chosen.clone()
        }
    }
}

impl Default for BlockSize {
    fn default() -> Self {
        Self::default_size()
    }
}

/// Samples per second.
#[derive(Clone)]
pub struct SampleRate(RateValue<f64>);

rate_handle!(SampleRate, f64);

impl SampleRate {
    pub const DEFAULT: f64 = 44100.0;
    const NO_PREFERENCE: f64 = -1.0;

    pub fn new(rate: f64) -> Self {
        Self(RateValue::new(rate))
    }

    /// Sentinel meaning "take the sample rate of my inputs".
    pub fn no_preference() -> Self {
        Self::new(Self::NO_PREFERENCE)
    }

    #[inline]
    pub fn is_no_preference(&self) -> bool {
        self.get() < 0.0
    }

    pub fn default_rate() -> Self {
        static DEFAULT: OnceLock<SampleRate> = OnceLock::new();
        DEFAULT
            .get_or_init(|| SampleRate::new(Self::DEFAULT))
            .clone()
    }

    pub fn set_default(rate: f64) -> Result<()> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(Error::InvalidSampleRate(rate));
        }

        let default = Self::default_rate();
        if default.get() != rate {
            default.set(rate);
            tracing::info!("Default sample rate set to {} Hz", rate);
        }
        Ok(())
    }

    /// Rate at which one-sample blocks keep pace with default-size audio blocks.
    ///
    /// Snapshot of the current defaults; later default changes do not update it.
    pub fn control_rate() -> Self {
        Self::new(Self::default_block_rate_value())
    }

    /// Blocks per second at the default rate and block size. Snapshot, like
    /// [`control_rate`](Self::control_rate).
    pub fn default_block_rate() -> Self {
        Self::new(Self::default_block_rate_value())
    }

    fn default_block_rate_value() -> f64 {
        Self::default_rate().get() / BlockSize::default_size().get() as f64
    }

    /// Length of one sample in clock ticks.
    #[inline]
    pub fn sample_duration_ticks(&self) -> f64 {
        Clock::TICKS / self.get()
    }

    /// Same rule as [`BlockSize::decide`].
    pub fn decide(input: &SampleRate, preferred: &SampleRate) -> SampleRate {
        let chosen = if preferred.is_no_preference() {
            input
        } else {
            preferred
        };

        if chosen.is_no_preference() {
            Self::default_rate()
        } else {
            chosen.clone()
        }
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        Self::default_rate()
    }
}

/// Fraction of a block by which successive renders advance, in `(0, 1]`.
#[derive(Clone)]
pub struct Overlap(RateValue<f64>);

rate_handle!(Overlap, f64);

impl Overlap {
    pub fn new(overlap: f64) -> Self {
        debug_assert!(overlap > 0.0 && overlap <= 1.0, "overlap {overlap} out of range");
        Self(RateValue::new(overlap))
    }

    pub fn try_new(overlap: f64) -> Result<Self> {
        if overlap > 0.0 && overlap <= 1.0 {
            Ok(Self(RateValue::new(overlap)))
        } else {
            Err(Error::InvalidOverlap(overlap))
        }
    }

    /// Shared overlap of 1: blocks follow each other without overlapping.
    pub fn none() -> Self {
        static NONE: OnceLock<Overlap> = OnceLock::new();
        NONE.get_or_init(|| Overlap::new(1.0)).clone()
    }
}

impl Default for Overlap {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decide_prefers_explicit_value() {
        let input = BlockSize::new(64);
        let preferred = BlockSize::new(128);
        assert!(BlockSize::decide(&input, &preferred).same_as(&preferred));
        assert!(BlockSize::decide(&input, &BlockSize::no_preference()).same_as(&input));
    }

    #[test]
    fn test_decide_falls_back_to_default() {
        let chosen = BlockSize::decide(&BlockSize::no_preference(), &BlockSize::no_preference());
        assert!(chosen.same_as(&BlockSize::default_size()));

        let rate = SampleRate::decide(&SampleRate::no_preference(), &SampleRate::no_preference());
        assert!(rate.same_as(&SampleRate::default_rate()));
    }

    #[test]
    fn test_shared_handle_broadcasts() {
        let a = SampleRate::new(48000.0);
        let b = a.clone();
        let before = b.generation();
        a.set(96000.0);
        assert_eq!(b.get(), 96000.0);
        assert_eq!(b.generation(), before + 1);
    }

    #[test]
    fn test_equality_is_by_value() {
        assert_eq!(BlockSize::new(64), BlockSize::new(64));
        assert!(!BlockSize::new(64).same_as(&BlockSize::new(64)));
    }

    #[test]
    fn test_sample_duration() {
        let rate = SampleRate::new(1_000_000.0);
        assert_eq!(rate.sample_duration_ticks(), 1.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert_eq!(BlockSize::set_default(0), Err(Error::InvalidBlockSize(0)));
        assert!(SampleRate::set_default(f64::NAN).is_err());
        assert_eq!(Overlap::try_new(1.5).err(), Some(Error::InvalidOverlap(1.5)));
        assert!(Overlap::try_new(0.5).is_ok());
    }
}
