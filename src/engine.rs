//! Engine driving a weft graph from a host audio callback.

use crate::{EngineBuilder, Result};
use smallvec::SmallVec;
use weft_core::{
    BlockSize, Bus, BusKey, BusRegistry, Clock, EngineConfig, Error as CoreError, RenderContext,
    Sample, SampleRate, Unit,
};

type Channels<'a> = SmallVec<[&'a mut [Sample]; 8]>;

/// Renders an output [`Unit`] in host-sized buffers.
///
/// Host input channel `i` is written into bus `input{i}` of the engine's own
/// [`BusRegistry`] before the graph is pulled, so graphs read host input with
/// [`Unit::read_busses`]. Host buffers of any length are rendered in chunks
/// of the configured graph block size.
///
/// # Example
///
/// ```
/// use weft::prelude::*;
///
/// let mut engine = Engine::builder().inputs(1).outputs(1).build()?;
/// let input = engine.bus("input0");
/// engine.set_output(Unit::read_busses(&[input], BlockSize::default_size()) * 0.5);
///
/// let host_in = vec![1.0; 1024];
/// let mut host_out = vec![0.0; 1024];
/// engine.render(&[&host_in[..]], &mut [&mut host_out[..]])?;
/// assert!(host_out.iter().all(|&s| s == 0.5));
/// # Ok::<(), weft::Error>(())
/// ```
pub struct Engine {
    config: EngineConfig,
    ctx: RenderContext,
    output: Unit,
    busses: BusRegistry,
    input_busses: Vec<Bus>,
    /// Scratch for interleaved rendering, one graph block per channel.
    scratch_in: Vec<Vec<Sample>>,
    scratch_out: Vec<Vec<Sample>>,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub(crate) fn new(config: EngineConfig) -> Result<Self> {
        BlockSize::set_default(config.graph_block_size)?;
        SampleRate::set_default(config.sample_rate)?;

        let mut busses = BusRegistry::with_settings(
            BlockSize::new(config.bus_buffer_size),
            SampleRate::default_rate(),
            BlockSize::default_size(),
        );
        let input_busses = (0..config.inputs)
            .map(|i| busses.get_or_create(format!("input{i}")))
            .collect();

        let block = config.graph_block_size;
        tracing::info!(
            "Engine ready: {} Hz, {} sample blocks, {} in / {} out",
            config.sample_rate,
            block,
            config.inputs,
            config.outputs
        );

        Ok(Self {
            ctx: RenderContext::new(Clock::ZERO),
            output: Unit::null(),
            busses,
            input_busses,
            scratch_in: vec![vec![0.0; block]; config.inputs],
            scratch_out: vec![vec![0.0; block]; config.outputs],
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f64 {
        self.config.sample_rate
    }

    /// Start of the next block to render.
    pub fn clock(&self) -> Clock {
        self.ctx.clock()
    }

    /// Replaces the unit pulled for output. Channel `i` feeds host output `i`.
    pub fn set_output(&mut self, output: Unit) {
        tracing::debug!("Output set to {} channel(s)", output.num_channels());
        self.output = output;
    }

    pub fn output(&self) -> &Unit {
        &self.output
    }

    /// Bus carrying host input channel `index`.
    pub fn input_bus(&self, index: usize) -> Option<&Bus> {
        self.input_busses.get(index)
    }

    /// Bus `key` of this engine's registry, created on first use.
    pub fn bus(&mut self, key: impl Into<BusKey>) -> Bus {
        self.busses.get_or_create(key)
    }

    pub fn busses(&mut self) -> &mut BusRegistry {
        &mut self.busses
    }

    /// Renders one host buffer per channel.
    ///
    /// Output buffers must all have the same length, and every one is filled.
    /// A shorter input is treated as silence past its end.
    pub fn render(&mut self, inputs: &[&[Sample]], outputs: &mut [&mut [Sample]]) -> Result<()> {
        Self::check_channels(self.config.inputs, inputs.len())?;
        Self::check_channels(self.config.outputs, outputs.len())?;

        let frames = outputs.first().map_or(0, |o| o.len());
        if let Some(other) = outputs.iter().find(|o| o.len() != frames) {
            return Err(CoreError::FrameMismatch {
                expected: frames,
                actual: other.len(),
            }
            .into());
        }
        let block = self.config.graph_block_size;

        let mut start = 0;
        while start < frames {
            let end = (start + block).min(frames);
            let mut chunk: Channels<'_> = outputs.iter_mut().map(|o| &mut o[start..end]).collect();
            self.write_inputs(inputs, start, end);
            self.render_chunk(&mut chunk);
            start = end;
        }

        Ok(())
    }

    /// Like [`render`](Self::render) for interleaved host buffers.
    pub fn render_interleaved(&mut self, input: &[Sample], output: &mut [Sample]) -> Result<()> {
        let (num_in, num_out) = (self.config.inputs, self.config.outputs);
        if output.len() % num_out != 0 {
            return Err(CoreError::ChannelMismatch {
                expected: num_out,
                actual: output.len() % num_out,
            }
            .into());
        }

        let frames = output.len() / num_out;
        let block = self.config.graph_block_size;
        let mut scratch_in = std::mem::take(&mut self.scratch_in);
        let mut scratch_out = std::mem::take(&mut self.scratch_out);

        let mut start = 0;
        while start < frames {
            let len = (frames - start).min(block);

            for (channel, buffer) in scratch_in.iter_mut().enumerate() {
                for (i, sample) in buffer[..len].iter_mut().enumerate() {
                    *sample = input
                        .get((start + i) * num_in + channel)
                        .copied()
                        .unwrap_or(0.0);
                }
            }

            let ins: SmallVec<[&[Sample]; 8]> =
                scratch_in.iter().map(|b| &b[..len]).collect();
            self.write_inputs(&ins, 0, len);

            let mut outs: Channels<'_> = scratch_out.iter_mut().map(|b| &mut b[..len]).collect();
            self.render_chunk(&mut outs);
            drop(outs);

            for (channel, buffer) in scratch_out.iter().enumerate() {
                for (i, &sample) in buffer[..len].iter().enumerate() {
                    output[(start + i) * num_out + channel] = sample;
                }
            }
            start += len;
        }

        self.scratch_in = scratch_in;
        self.scratch_out = scratch_out;
        Ok(())
    }

    fn check_channels(expected: usize, actual: usize) -> Result<()> {
        if expected != actual {
            return Err(CoreError::ChannelMismatch { expected, actual }.into());
        }
        Ok(())
    }

    fn write_inputs(&self, inputs: &[&[Sample]], start: usize, end: usize) {
        let clock = self.ctx.clock();
        for (bus, input) in self.input_busses.iter().zip(inputs) {
            let from = start.min(input.len());
            let to = end.min(input.len());
            if to - from == end - start {
                bus.write(clock, &input[from..to]);
            } else {
                let mut padded: SmallVec<[Sample; 512]> = SmallVec::from_slice(&input[from..to]);
                padded.resize(end - start, 0.0);
                bus.write(clock, &padded);
            }
        }
    }

    fn render_chunk(&mut self, outputs: &mut [&mut [Sample]]) {
        let frames = outputs.first().map_or(0, |o| o.len());
        self.output.process_into(&self.ctx, outputs);
        self.ctx.advance_samples(frames, self.config.sample_rate);
    }
}
