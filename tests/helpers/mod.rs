//! Test helpers and fixtures for weft integration tests
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations (passthrough, unity gain)
//! - `INTERP_EPSILON` (1e-4): Resampled signals
//! - `SILENCE_THRESHOLD` (0.0001): Silence detection (-80dB)

#![allow(dead_code)]

pub mod tolerances;

use weft::prelude::*;

/// Default test sample rate. Matches the process-wide default so tests
/// running in parallel never change it under each other.
pub const TEST_SAMPLE_RATE: f64 = 44100.0;

/// Graph block size used by test engines.
pub const TEST_BLOCK_SIZE: usize = 512;

/// Installs a `tracing` subscriber writing through the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Stereo engine with the default rates and no inputs.
pub fn test_engine() -> Engine {
    init_tracing();
    Engine::builder()
        .sample_rate(TEST_SAMPLE_RATE)
        .graph_block_size(TEST_BLOCK_SIZE)
        .build()
        .expect("Failed to create test engine")
}

/// Engine with `inputs` host inputs and `outputs` host outputs.
pub fn test_engine_io(inputs: usize, outputs: usize) -> Engine {
    init_tracing();
    Engine::builder()
        .inputs(inputs)
        .outputs(outputs)
        .build()
        .expect("Failed to create test engine")
}

/// Single-output source node running `process` once per block.
pub struct Source<F> {
    name: &'static str,
    process: F,
}

impl<F> Processor for Source<F>
where
    F: FnMut(&mut [Sample]) + 'static,
{
    fn name(&self) -> &str {
        self.name
    }

    fn process(&mut self, _ctx: &mut RenderContext, io: &mut Io<'_>) {
        (self.process)(&mut io.output(0));
    }
}

/// Unit wrapping a closure that fills each block.
pub fn source<F>(name: &'static str, block: usize, rate: f64, process: F) -> Unit
where
    F: FnMut(&mut [Sample]) + 'static,
{
    Unit::from_node(Node::new(
        Box::new(Source { name, process }),
        Inputs::new(),
        0,
        BlockSize::new(block),
        SampleRate::new(rate),
    ))
}

/// Counts up by one per sample, across blocks.
pub fn ramp(block: usize, rate: f64) -> Unit {
    let mut next = 0.0;
    source("Ramp", block, rate, move |out| {
        for sample in out.iter_mut() {
            *sample = next;
            next += 1.0;
        }
    })
}

/// Sine at `frequency`, phase-continuous across blocks.
pub fn sine(frequency: f64, block: usize, rate: f64) -> Unit {
    let mut phase = 0.0f64;
    let step = frequency / rate;
    source("Sine", block, rate, move |out| {
        for sample in out.iter_mut() {
            *sample = (phase * std::f64::consts::TAU).sin() as Sample;
            phase = (phase + step).fract();
        }
    })
}

/// Generate a test signal: sine wave at given frequency for specified samples.
pub fn generate_sine(frequency: f64, sample_rate: f64, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
        })
        .collect()
}

/// Calculate RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |max, &s| max.max(s.abs()))
}

/// Assert a buffer is silent.
pub fn assert_silence(samples: &[f32]) {
    let p = peak(samples);
    assert!(
        p < tolerances::SILENCE_THRESHOLD,
        "expected silence, peak was {}",
        p
    );
}

/// Compare two signals sample by sample.
pub fn signals_approx_equal(a: &[f32], b: &[f32], tolerance: f32) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() <= tolerance)
}
