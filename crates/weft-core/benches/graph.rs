//! Render throughput of small graphs and bus round trips.
//!
//! Run with: `cargo bench -p weft-core`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use weft_core::prelude::*;
use weft_core::{Io, Inputs};

const RATE: f64 = 44100.0;

struct Noise(u32);

impl Processor for Noise {
    fn name(&self) -> &str {
        "Noise"
    }

    fn process(&mut self, _ctx: &mut RenderContext, io: &mut Io<'_>) {
        for sample in io.output(0).iter_mut() {
            self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            *sample = (self.0 >> 8) as Sample / (1u32 << 24) as Sample - 0.5;
        }
    }
}

fn noise(block: usize) -> Unit {
    Unit::from_node(Node::new(
        Box::new(Noise(1)),
        Inputs::new(),
        0,
        BlockSize::new(block),
        SampleRate::new(RATE),
    ))
}

/// `depth` gain stages over one source, then a stereo split and mix.
fn chain(block: usize, depth: usize) -> Unit {
    let mut unit = noise(block);
    for _ in 0..depth {
        unit = unit * 0.99;
    }
    unit.concat(&unit).mix()
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/render");

    for block in [64, 256, 1024] {
        group.bench_with_input(BenchmarkId::new("chain8", block), &block, |b, &block| {
            let mut out = chain(block, 8);
            let mut buffer = vec![0.0; block];
            let mut ctx = RenderContext::new(Clock::ZERO);
            b.iter(|| {
                out.process_into(&ctx, &mut [&mut buffer[..]]);
                ctx.advance_samples(block, RATE);
                black_box(&buffer);
            });
        });
    }

    group.finish();
}

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/resample");

    for interp in [Interp::Nearest, Interp::Linear, Interp::Cubic] {
        group.bench_function(format!("{interp:?}"), |b| {
            let mut out = noise(256).ar_with(interp, BlockSize::new(256), SampleRate::new(48000.0));
            let mut buffer = vec![0.0; 256];
            let mut ctx = RenderContext::new(Clock::ZERO);
            b.iter(|| {
                out.process_into(&ctx, &mut [&mut buffer[..]]);
                ctx.advance_samples(256, 48000.0);
                black_box(&buffer);
            });
        });
    }

    group.finish();
}

fn bench_bus(c: &mut Criterion) {
    c.bench_function("bus/write_read_512", |b| {
        let bus = Bus::with_settings(
            BlockSize::new(4096),
            SampleRate::new(RATE),
            BlockSize::new(512),
        );
        let block = vec![0.25; 512];
        let mut dest = vec![0.0; 512];
        let mut clock = Clock::ZERO;
        b.iter(|| {
            bus.write(clock, &block);
            let mut start = clock;
            black_box(bus.read(&mut start, &mut dest));
            clock = start;
        });
    });
}

criterion_group!(benches, bench_render, bench_resample, bench_bus);
criterion_main!(benches);
