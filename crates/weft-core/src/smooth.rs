//! Linear ramps for control values crossing into the audio path.

use crate::Sample;

/// A value that moves to a new target in a straight line over a fixed number
/// of samples instead of jumping.
///
/// ```
/// use weft_core::SmoothedValue;
///
/// let mut gain = SmoothedValue::new(1.0, 0.01, 44100.0);
/// gain.set_target(0.0);
///
/// let mut block = [0.0; 64];
/// gain.fill(&mut block);
/// assert!(block[63] < 1.0 && gain.is_ramping());
/// ```
#[derive(Debug, Clone)]
pub struct SmoothedValue {
    value: Sample,
    target: Sample,
    increment: Sample,
    remaining: u32,
    ramp_len: u32,
}

impl SmoothedValue {
    /// Starts at `initial`; later targets are reached after `ramp_secs`.
    pub fn new(initial: Sample, ramp_secs: f32, sample_rate: f64) -> Self {
        Self {
            value: initial,
            target: initial,
            increment: 0.0,
            remaining: 0,
            ramp_len: Self::ramp_samples(ramp_secs, sample_rate),
        }
    }

    /// Jumps straight to every new target.
    pub fn immediate(initial: Sample) -> Self {
        Self {
            value: initial,
            target: initial,
            increment: 0.0,
            remaining: 0,
            ramp_len: 1,
        }
    }

    fn ramp_samples(ramp_secs: f32, sample_rate: f64) -> u32 {
        (ramp_secs.max(0.0) as f64 * sample_rate).round().max(1.0) as u32
    }

    /// Applies from the next `set_target`.
    pub fn set_ramp_time(&mut self, ramp_secs: f32, sample_rate: f64) {
        self.ramp_len = Self::ramp_samples(ramp_secs, sample_rate);
    }

    /// Restarts the ramp from the current value. Repeating the current target
    /// is a no-op, so this can be called every block.
    #[inline]
    pub fn set_target(&mut self, target: Sample) {
        if target == self.target {
            return;
        }

        self.target = target;
        self.remaining = self.ramp_len;
        self.increment = (target - self.value) / self.ramp_len as Sample;
    }

    #[inline]
    pub fn set_immediate(&mut self, value: Sample) {
        self.value = value;
        self.target = value;
        self.increment = 0.0;
        self.remaining = 0;
    }

    #[inline]
    pub fn next_sample(&mut self) -> Sample {
        match self.remaining {
            0 => {}
            1 => {
                self.value = self.target;
                self.remaining = 0;
            }
            _ => {
                self.value += self.increment;
                self.remaining -= 1;
            }
        }
        self.value
    }

    /// Writes the next `block.len()` ramp values.
    pub fn fill(&mut self, block: &mut [Sample]) {
        if self.remaining == 0 {
            block.fill(self.value);
            return;
        }
        for sample in block.iter_mut() {
            *sample = self.next_sample();
        }
    }

    #[inline]
    pub fn value(&self) -> Sample {
        self.value
    }

    #[inline]
    pub fn target(&self) -> Sample {
        self.target
    }

    #[inline]
    pub fn is_ramping(&self) -> bool {
        self.remaining > 0
    }
}

impl Default for SmoothedValue {
    fn default() -> Self {
        Self::immediate(0.0)
    }
}
