//! Time-indexed ring buffers for routing signal between graphs.
//!
//! A [`Bus`] is addressed by [`Clock`] rather than by a read or write cursor.
//! Writers stamp each span with its start time; readers ask for a time span
//! and either get exactly those samples or silence. Several writers landing
//! on the same span in one step are mixed together.
//!
//! Positions are computed from a fixed anchor, `window_start`, modulo the
//! physical length. Crossing the end of the window only moves the anchor by
//! whole windows, so positions never shift.
//!
//! A reader that keeps missing by a distance that is not shrinking makes the
//! bus double its size. Producer and consumer rate mismatches settle into a
//! larger buffer instead of a permanent dropout.
//!
//! Busses are `Rc`-based and stay on the thread that renders them.

mod registry;

pub use registry::{BusKey, BusRegistry};

use crate::rate::{BlockSize, SampleRate};
use crate::{Clock, Sample};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::OnceLock;

struct BusState {
    buffer_size: BlockSize,
    seen_generation: u32,
    sample_rate: SampleRate,
    samples: Vec<Sample>,
    window_start: Clock,
    window_end: Clock,
    latest_valid: Clock,
    /// Nothing before this clock is in the buffer, even when the window says so.
    valid_since: Clock,
    last_read_lag: f64,
    /// Nominal length of one writer's block; no preference means "whatever
    /// the first write of a step was".
    write_block: BlockSize,
    first_write_size: usize,
}

impl BusState {
    fn new(buffer_size: BlockSize, sample_rate: SampleRate, write_block: BlockSize) -> Self {
        let len = buffer_size.get().max(1);
        let mut state = Self {
            seen_generation: buffer_size.generation(),
            buffer_size,
            sample_rate,
            samples: vec![0.0; len],
            window_start: Clock::ZERO,
            window_end: Clock::ZERO,
            latest_valid: Clock::ZERO,
            valid_since: Clock::ZERO,
            last_read_lag: f64::INFINITY,
            write_block,
            first_write_size: 0,
        };
        state.window_end = state.window_start + state.duration();
        state
    }

    #[inline]
    fn rate(&self) -> f64 {
        self.sample_rate.get()
    }

    #[inline]
    fn ticks(&self, samples: f64) -> f64 {
        Clock::ticks_for_samples(samples, self.rate())
    }

    /// Span covered by the whole buffer.
    fn duration(&self) -> f64 {
        self.ticks(self.samples.len() as f64)
    }

    fn earliest_valid(&self) -> Clock {
        (self.latest_valid - self.duration()).max(self.valid_since)
    }

    /// Sample index of `clock` counted from the anchor.
    fn index_of(&self, clock: Clock) -> i64 {
        (clock - self.window_start).to_samples(self.rate()).round() as i64
    }

    fn position(&self, clock: Clock) -> usize {
        self.index_of(clock).rem_euclid(self.samples.len() as i64) as usize
    }

    /// Picks up a new `buffer_size`. The bus only ever grows.
    fn sync(&mut self) {
        let generation = self.buffer_size.generation();
        if generation == self.seen_generation {
            return;
        }
        self.seen_generation = generation;

        let old_len = self.samples.len();
        let new_len = self.buffer_size.get();
        if new_len <= old_len {
            return;
        }

        let old_duration = self.duration();
        self.valid_since = self.valid_since.max(self.latest_valid - old_duration);

        let end = self.index_of(self.latest_valid);
        let begin = self.index_of(self.valid_since).max(end - old_len as i64);

        let mut grown = vec![0.0; new_len];
        for index in begin..end {
            grown[index.rem_euclid(new_len as i64) as usize] =
                self.samples[index.rem_euclid(old_len as i64) as usize];
        }
        self.samples = grown;
        self.window_end = self.window_start + self.duration();
        while self.latest_valid >= self.window_end {
            self.roll();
        }

        tracing::debug!("Bus grew from {} to {} samples", old_len, new_len);
    }

    fn roll(&mut self) {
        let duration = self.duration();
        self.window_start = self.window_end;
        self.window_end += duration;
    }

    fn write(&mut self, start: Clock, data: &[Sample]) {
        self.sync();

        let n = data.len();
        if n == 0 {
            return;
        }

        let span = self.ticks(n as f64);
        let half = self.ticks(0.5);
        let len = self.samples.len();

        if start + span <= self.latest_valid + half {
            debug_assert_eq!(
                n, self.first_write_size,
                "mixed bus writes must match the write block"
            );
            let offset = self.position(start);
            for (i, &sample) in data.iter().enumerate() {
                self.samples[(offset + i) % len] += sample;
            }
            return;
        }

        self.first_write_size = if self.write_block.is_no_preference() {
            n
        } else {
            self.write_block.get()
        };
        let duration = self.duration();

        if start >= self.latest_valid + duration {
            // Long pause: nothing in the buffer is worth keeping.
            self.samples.fill(0.0);
            self.window_start = start;
            self.window_end = start + duration;
            self.valid_since = start;
        } else if start > self.latest_valid {
            let gap = (start - self.latest_valid).to_samples(self.rate()).round() as usize;
            let offset = self.position(self.latest_valid);
            for i in 0..gap.min(len) {
                self.samples[(offset + i) % len] = 0.0;
            }
        }

        while start >= self.window_end {
            self.roll();
        }

        let offset = self.position(start);
        for (i, &sample) in data.iter().enumerate() {
            self.samples[(offset + i) % len] = sample;
        }

        self.latest_valid = self.latest_valid.max(start + span);
    }

    fn read(&mut self, start: &mut Clock, dest: &mut [Sample]) -> bool {
        self.sync();

        let n = dest.len();
        let span = self.ticks(n as f64);
        let half = self.ticks(0.5);
        let end = *start + span;

        let hit = n <= self.samples.len()
            && *start + half >= self.earliest_valid()
            && *start < self.latest_valid
            && end <= self.latest_valid + half;

        if hit {
            let len = self.samples.len();
            let offset = self.position(*start);
            for (i, sample) in dest.iter_mut().enumerate() {
                *sample = self.samples[(offset + i) % len];
            }
            *start = end;
            self.last_read_lag = f64::INFINITY;
            return true;
        }

        dest.fill(0.0);

        let lag = (self.latest_valid - end).value();
        if lag > 0.0 && lag >= self.last_read_lag {
            let size = self.buffer_size.get();
            self.buffer_size.set(size * 2);
            self.sync();
        }
        self.last_read_lag = lag;
        false
    }
}

/// Shared handle to a time-indexed ring buffer.
#[derive(Clone)]
pub struct Bus(Rc<RefCell<BusState>>);

impl Bus {
    /// Samples held by a bus created with the defaults.
    pub const DEFAULT_BUFFER_SIZE: usize = 32_768;

    /// Buffer size handle shared by every default bus. Setting it resizes all
    /// of them on their next access.
    pub fn default_buffer_size() -> BlockSize {
        static DEFAULT: OnceLock<BlockSize> = OnceLock::new();
        DEFAULT
            .get_or_init(|| BlockSize::new(Self::DEFAULT_BUFFER_SIZE))
            .clone()
    }

    /// Unregistered bus with the default size, sample rate and write block.
    pub fn new() -> Self {
        Self::with_settings(
            Self::default_buffer_size(),
            SampleRate::default_rate(),
            BlockSize::default_size(),
        )
    }

    /// Bus holding `buffer_size` samples at `sample_rate`.
    ///
    /// Writers mixing into one step are expected to write `write_block`
    /// samples each. Pass [`BlockSize::no_preference`] to take the length of
    /// each step's first write instead.
    pub fn with_settings(
        buffer_size: BlockSize,
        sample_rate: SampleRate,
        write_block: BlockSize,
    ) -> Self {
        debug_assert!(buffer_size.get() > 0);
        Self(Rc::new(RefCell::new(BusState::new(
            buffer_size,
            sample_rate,
            write_block,
        ))))
    }

    /// Bus `key` from this thread's default registry, created on first use.
    pub fn named(key: impl Into<BusKey>) -> Self {
        BusRegistry::with_default(|registry| registry.get_or_create(key))
    }

    /// Writes `data` starting at `start`.
    ///
    /// A span that ends no later than what is already written is mixed into
    /// it; anything else overwrites. Skipped time is zeroed.
    pub fn write(&self, start: Clock, data: &[Sample]) {
        self.0.borrow_mut().write(start, data);
    }

    /// Reads `dest.len()` samples from `*start`.
    ///
    /// On success `start` moves past the span and `true` is returned.
    /// Otherwise `dest` is silent and `start` is left alone.
    pub fn read(&self, start: &mut Clock, dest: &mut [Sample]) -> bool {
        self.0.borrow_mut().read(start, dest)
    }

    /// Reads the newest `dest.len()` samples.
    pub fn read_latest(&self, dest: &mut [Sample]) -> bool {
        let mut state = self.0.borrow_mut();
        let mut start = state.latest_valid - state.ticks(dest.len() as f64);
        state.read(&mut start, dest)
    }

    pub fn buffer_size(&self) -> BlockSize {
        self.0.borrow().buffer_size.clone()
    }

    /// Current physical length, after any pending resize.
    pub fn len(&self) -> usize {
        let mut state = self.0.borrow_mut();
        state.sync();
        state.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sample_rate(&self) -> SampleRate {
        self.0.borrow().sample_rate.clone()
    }

    pub fn write_block(&self) -> BlockSize {
        self.0.borrow().write_block.clone()
    }

    /// End of the newest write.
    pub fn latest_valid(&self) -> Clock {
        self.0.borrow().latest_valid
    }

    /// Oldest clock a read can still start at.
    pub fn earliest_valid(&self) -> Clock {
        self.0.borrow().earliest_valid()
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Bus) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(state) => f
                .debug_struct("Bus")
                .field("len", &state.samples.len())
                .field("latest_valid", &state.latest_valid)
                .finish(),
            Err(_) => f.write_str("Bus(<busy>)"),
        }
    }
}
