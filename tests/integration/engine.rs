//! Engine configuration and rendering integration tests

use crate::helpers::*;
use weft::core::Error as CoreError;
use weft::prelude::*;
use weft::Error;

#[test]
fn test_engine_default_config() {
    let engine = test_engine();
    assert_eq!(engine.sample_rate(), TEST_SAMPLE_RATE);
    assert_eq!(engine.config().graph_block_size, TEST_BLOCK_SIZE);
    assert_eq!(engine.config().outputs, 2);
    assert_eq!(engine.clock(), Clock::ZERO);
    assert!(engine.output().is_null());
}

#[test]
fn test_builder_rejects_invalid_config() {
    let result = Engine::builder().sample_rate(1000.0).build();
    assert!(matches!(result, Err(Error::Core(CoreError::InvalidConfig(_)))));

    let result = Engine::builder().graph_block_size(0).build();
    assert!(matches!(result, Err(Error::Core(CoreError::InvalidConfig(_)))));

    let result = Engine::builder().bus_buffer_size(1000).build();
    assert!(result.is_err());
}

#[test]
fn test_builder_from_config() {
    let config = EngineConfig {
        outputs: 1,
        ..Default::default()
    };
    let builder = EngineBuilder::from_config(config.clone());
    assert_eq!(builder.config(), &config);
    assert_eq!(builder.build().map(|e| e.config().outputs), Ok(1));
}

#[test]
fn test_render_rejects_wrong_channel_count() {
    let mut engine = test_engine();
    let mut mono = vec![0.0; 64];
    let result = engine.render(&[], &mut [&mut mono[..]]);
    assert_eq!(
        result,
        Err(Error::Core(CoreError::ChannelMismatch {
            expected: 2,
            actual: 1
        }))
    );
}

#[test]
fn test_render_rejects_unequal_output_lengths() {
    let mut engine = test_engine();
    let mut left = vec![1.0; 512];
    let mut right = vec![1.0; 700];

    let result = engine.render(&[], &mut [&mut left[..], &mut right[..]]);
    assert_eq!(
        result,
        Err(Error::Core(CoreError::FrameMismatch {
            expected: 512,
            actual: 700
        }))
    );
    assert_eq!(engine.clock(), Clock::ZERO);
    assert!(right.iter().all(|&s| s == 1.0));
}

#[test]
fn test_null_output_renders_silence() {
    let mut engine = test_engine();
    let mut left = vec![1.0; 700];
    let mut right = vec![1.0; 700];
    engine
        .render(&[], &mut [&mut left[..], &mut right[..]])
        .unwrap();
    assert_silence(&left);
    assert_silence(&right);
}

#[test]
fn test_render_in_chunks_advances_clock() {
    let mut engine = test_engine();
    engine.set_output(ramp(TEST_BLOCK_SIZE, TEST_SAMPLE_RATE));

    // Host buffers that do not line up with the graph block.
    let mut rendered = Vec::new();
    for _ in 0..3 {
        let mut left = vec![0.0; 700];
        let mut right = vec![0.0; 700];
        engine
            .render(&[], &mut [&mut left[..], &mut right[..]])
            .unwrap();
        assert_eq!(left, right);
        rendered.extend_from_slice(&left);
    }

    let expected: Vec<Sample> = (0..2100).map(|i| i as Sample).collect();
    assert_eq!(rendered, expected);
    assert_eq!(
        engine.clock().to_samples(TEST_SAMPLE_RATE).round(),
        2100.0
    );
}

#[test]
fn test_input_passthrough() {
    let mut engine = test_engine_io(1, 1);
    let input = engine.bus("input0");
    assert!(engine.input_bus(0).is_some_and(|b| b.ptr_eq(&input)));
    engine.set_output(Unit::read_busses(&[input], BlockSize::new(TEST_BLOCK_SIZE)));

    let signal = generate_sine(440.0, TEST_SAMPLE_RATE, 4096);
    for chunk in signal.chunks(1024) {
        let mut out = vec![0.0; 1024];
        engine.render(&[chunk], &mut [&mut out[..]]).unwrap();
        assert_eq!(out, chunk);
    }
}

#[test]
fn test_render_interleaved() {
    let mut engine = test_engine();
    engine.set_output(Unit::from_values(&[0.5, -0.5]));

    let mut out = vec![0.0; 2 * 600];
    engine.render_interleaved(&[], &mut out).unwrap();
    for frame in out.chunks(2) {
        assert_eq!(frame, [0.5, -0.5]);
    }

    let mut odd = vec![0.0; 5];
    assert!(engine.render_interleaved(&[], &mut odd).is_err());
}

#[test]
fn test_interleaved_input_passthrough() {
    let mut engine = test_engine_io(2, 2);
    let left = engine.bus("input0");
    let right = engine.bus("input1");
    engine.set_output(Unit::read_busses(
        &[left, right],
        BlockSize::new(TEST_BLOCK_SIZE),
    ));

    let input: Vec<Sample> = (0..2048).map(|i| if i % 2 == 0 { 0.25 } else { -0.75 }).collect();
    let mut out = vec![0.0; 2048];
    engine.render_interleaved(&input, &mut out).unwrap();
    assert_eq!(out, input);
}
