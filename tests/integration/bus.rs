//! Bus routing between graphs

use crate::helpers::tolerances::*;
use crate::helpers::*;
use weft::prelude::*;

fn dc(value: Sample) -> Unit {
    source("Dc", TEST_BLOCK_SIZE, TEST_SAMPLE_RATE, move |out| out.fill(value))
}

#[test]
fn test_reader_hears_writer_in_same_block() {
    let mut engine = test_engine();
    let bus = engine.bus("send");

    let writer = sine(440.0, TEST_BLOCK_SIZE, TEST_SAMPLE_RATE).write_busses(vec![bus.clone()]);
    let reader = Unit::read_busses(&[bus], BlockSize::new(TEST_BLOCK_SIZE));
    engine.set_output(writer.concat(&reader));

    let mut l = vec![0.0; 1024];
    let mut r = vec![0.0; 1024];
    for _ in 0..3 {
        engine.render(&[], &mut [&mut l[..], &mut r[..]]).unwrap();
        assert!(signals_approx_equal(&l, &r, FLOAT_EPSILON));
    }
    assert!(rms(&r) > 0.5);
}

#[test]
fn test_writers_on_one_bus_mix() {
    let mut engine = test_engine_io(0, 3);
    let bus = engine.bus(7);

    let quiet = dc(0.25).write_busses(vec![bus.clone()]);
    let loud = dc(0.5).write_busses(vec![bus.clone()]);
    let reader = Unit::read_busses(&[bus], BlockSize::new(TEST_BLOCK_SIZE));
    engine.set_output(quiet.concat(&loud).concat(&reader));

    let mut out: [Vec<Sample>; 3] = std::array::from_fn(|_| vec![0.0; TEST_BLOCK_SIZE]);
    for _ in 0..2 {
        let [a, b, mixed] = &mut out;
        engine
            .render(&[], &mut [&mut a[..], &mut b[..], &mut mixed[..]])
            .unwrap();
        assert!(mixed.iter().all(|&s| (s - 0.75).abs() < FLOAT_EPSILON));
    }
}

#[test]
fn test_reader_without_writer_is_silent() {
    let mut engine = test_engine_io(0, 1);
    let bus = engine.bus("nobody");
    engine.set_output(Unit::read_busses(&[bus], BlockSize::new(TEST_BLOCK_SIZE)));

    let mut out = vec![1.0; 2048];
    engine.render(&[], &mut [&mut out[..]]).unwrap();
    assert_silence(&out);
}

#[test]
fn test_engine_registry_is_separate_from_thread_default() {
    let mut engine = test_engine();

    let first = engine.bus("fx");
    let again = engine.bus("fx");
    assert!(first.ptr_eq(&again));
    assert!(!first.ptr_eq(&Bus::named("fx")));
    assert_eq!(engine.busses().name_of(&first).map(|k| k.to_string()), Some("fx".into()));
}
