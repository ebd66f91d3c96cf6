//! Graph construction and rendering integration tests

use crate::helpers::tolerances::*;
use crate::helpers::*;
use approx::assert_relative_eq;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use weft::prelude::*;

/// Two outputs: the input and its negation.
struct Split;

impl Processor for Split {
    fn name(&self) -> &str {
        "Split"
    }

    fn num_outputs(&self) -> usize {
        2
    }

    fn process(&mut self, ctx: &mut RenderContext, io: &mut Io<'_>) {
        let input = io.pull(ctx, IoKey::Generic);
        let input = input.read();
        io.output(0).copy_from_slice(&input);
        for (out, &x) in io.output(1).iter_mut().zip(input.iter()) {
            *out = -x;
        }
    }
}

#[test]
fn test_shared_source_renders_once_per_block() {
    let renders = Rc::new(Cell::new(0));
    let counter = renders.clone();
    let shared = source("Counted", TEST_BLOCK_SIZE, TEST_SAMPLE_RATE, move |out| {
        counter.set(counter.get() + 1);
        out.fill(0.25);
    });

    let mut engine = test_engine();
    let left = &shared * &Unit::constant(2.0);
    let right = &shared + &shared;
    engine.set_output(left.concat(&right));

    let mut l = vec![0.0; TEST_BLOCK_SIZE * 4];
    let mut r = vec![0.0; TEST_BLOCK_SIZE * 4];
    engine.render(&[], &mut [&mut l[..], &mut r[..]]).unwrap();

    assert_eq!(renders.get(), 4);
    assert!(l.iter().all(|&s| s == 0.5));
    assert!(r.iter().all(|&s| s == 0.5));
}

#[test]
fn test_fan_out_split_through_engine() {
    let input = sine(440.0, TEST_BLOCK_SIZE, TEST_SAMPLE_RATE);
    let split = Unit::proxies_from_inputs(
        Inputs::new().with(IoKey::Generic, input),
        BlockSize::no_preference(),
        SampleRate::no_preference(),
        Box::new(Split),
    );
    assert_eq!(split.num_channels(), 2);
    assert!(split.node(1).is_proxy());
    assert_eq!(split.node(1).label(), "Proxy (Split channel 1)");

    let mut engine = test_engine();
    engine.set_output(split);

    let mut l = vec![0.0; 2048];
    let mut r = vec![0.0; 2048];
    engine.render(&[], &mut [&mut l[..], &mut r[..]]).unwrap();

    assert!(rms(&l) > 0.5);
    for (a, b) in l.iter().zip(&r) {
        assert_eq!(*a, -*b);
    }
}

#[test]
fn test_mix_to_mono() {
    let mut engine = test_engine_io(0, 1);
    let stereo = sine(440.0, TEST_BLOCK_SIZE, TEST_SAMPLE_RATE)
        .concat(&sine(440.0, TEST_BLOCK_SIZE, TEST_SAMPLE_RATE));
    engine.set_output(stereo.mix() * 0.5);

    let mut out = vec![0.0; 4096];
    engine.render(&[], &mut [&mut out[..]]).unwrap();

    let reference = generate_sine(440.0, TEST_SAMPLE_RATE, 4096);
    assert!(signals_approx_equal(&out, &reference, FLOAT_EPSILON));
}

#[test]
fn test_resampled_sine_keeps_level() {
    let mut engine = test_engine_io(0, 1);
    let low = sine(440.0, 256, 22050.0);
    engine.set_output(low.ar(Interp::Cubic));

    let mut out = vec![0.0; 8192];
    engine.render(&[], &mut [&mut out[..]]).unwrap();

    assert_relative_eq!(rms(&out[1024..]), std::f32::consts::FRAC_1_SQRT_2, epsilon = 0.01);
    assert!(peak(&out) < 1.01);
}

#[test]
fn test_control_rate_takes_one_sample_per_block() {
    let mut control = ramp(TEST_BLOCK_SIZE, TEST_SAMPLE_RATE).kr(Interp::Nearest);
    assert_eq!(control.block_size(0).get(), 1);

    let mut out = [0.0; 4];
    control.process_into(&RenderContext::default(), &mut [&mut out[..]]);

    // Each control sample is the ramp at its block start, less the resampler's latency.
    let lag = weft::core::Resample::LATENCY;
    let expected: Vec<Sample> = (0..4)
        .map(|k| (k * TEST_BLOCK_SIZE).saturating_sub(lag) as Sample)
        .collect();
    assert_eq!(out.to_vec(), expected);
}

#[test]
fn test_param_ramps_to_new_value() {
    let cell = Arc::new(AtomicFloat::new(0.0));
    let mut engine = test_engine_io(0, 1);
    engine.set_output(Unit::param(cell.clone(), 0.005));

    let mut out = vec![0.0; TEST_BLOCK_SIZE];
    engine.render(&[], &mut [&mut out[..]]).unwrap();
    assert_silence(&out);

    cell.set(1.0);
    let mut out = vec![0.0; TEST_BLOCK_SIZE * 2];
    engine.render(&[], &mut [&mut out[..]]).unwrap();

    assert!(out[0] > 0.0 && out[0] < 0.1);
    assert!(out.windows(2).all(|w| w[1] >= w[0]));
    assert_eq!(out[out.len() - 1], 1.0);
}

#[test]
fn test_finished_source_goes_silent() {
    let finishing = Unit::from_node(Node::new(
        Box::new(Finish { blocks: 0 }),
        Inputs::new(),
        0,
        BlockSize::new(TEST_BLOCK_SIZE),
        SampleRate::new(TEST_SAMPLE_RATE),
    ));

    let mut engine = test_engine_io(0, 1);
    engine.set_output(finishing * 1.0);

    let mut out = vec![0.0; TEST_BLOCK_SIZE];
    for _ in 0..4 {
        engine.render(&[], &mut [&mut out[..]]).unwrap();
    }

    assert_silence(&out);
    assert!(engine.output().is_null());
}

/// Plays one block, asks to be finalized on the second.
struct Finish {
    blocks: usize,
}

impl Processor for Finish {
    fn name(&self) -> &str {
        "Finish"
    }

    fn process(&mut self, ctx: &mut RenderContext, io: &mut Io<'_>) {
        self.blocks += 1;
        io.output(0).fill(1.0);
        if self.blocks >= 2 {
            ctx.set_should_finalize();
        }
    }
}

#[test]
fn test_convert_to_i16() {
    let mut engine = test_engine_io(0, 1);
    engine.set_output(sine(440.0, TEST_BLOCK_SIZE, TEST_SAMPLE_RATE).convert(SampleFormat::I16));

    let mut out = vec![0.0; 2048];
    engine.render(&[], &mut [&mut out[..]]).unwrap();

    let reference = generate_sine(440.0, TEST_SAMPLE_RATE, 2048);
    assert!(signals_approx_equal(&out, &reference, INT16_EPSILON));
}
