//! Per-traversal render state.

use crate::Clock;

/// Mutable record threaded through every node visit of one render pass.
///
/// The host creates one per block. A [`Unit`](crate::Unit) pulling channels
/// with different block sizes clones it per channel and advances each clone
/// independently.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderContext {
    clock: Clock,
    should_finalize: bool,
}

impl RenderContext {
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            should_finalize: false,
        }
    }

    #[inline]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[inline]
    pub fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    /// Moves the clock by `ticks`.
    #[inline]
    pub fn offset(&mut self, ticks: f64) {
        self.clock += ticks;
    }

    #[inline]
    pub fn advance_samples(&mut self, samples: usize, sample_rate: f64) {
        self.clock += Clock::ticks_for_samples(samples as f64, sample_rate);
    }

    /// True when some node in this pass asked to be finalized.
    #[inline]
    pub fn should_finalize(&self) -> bool {
        self.should_finalize
    }

    #[inline]
    pub fn set_should_finalize(&mut self) {
        self.should_finalize = true;
    }

    #[inline]
    pub fn reset_should_finalize(&mut self) {
        self.should_finalize = false;
    }
}
