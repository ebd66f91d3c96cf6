use crate::buffer::scaled_sample;
use crate::node::{Inputs, Io, IoKey, Processor};
use crate::rate::{BlockSize, SampleRate};
use crate::{Clock, RenderContext, Sample, Unit};
use serde::{Deserialize, Serialize};

/// Interpolation used between input samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interp {
    Nearest,
    #[default]
    Linear,
    Cubic,
}

impl Interp {
    /// Value at fractional position `pos` in `window`.
    ///
    /// Reads up to one sample before `pos` and two after it.
    #[inline]
    fn read(self, window: &[Sample], pos: f64) -> Sample {
        let last = window.len() - 1;
        let at = |i: usize| window[i.min(last)];

        match self {
            Interp::Nearest => at(pos.round() as usize),
            Interp::Linear => {
                let i = pos.floor() as usize;
                let frac = (pos - i as f64) as Sample;
                at(i) + (at(i + 1) - at(i)) * frac
            }
            Interp::Cubic => {
                let i = pos.floor() as usize;
                let f = (pos - i as f64) as Sample;
                let xm1 = at(i.saturating_sub(1));
                let (x0, x1, x2) = (at(i), at(i + 1), at(i + 2));

                let c0 = x0;
                let c1 = 0.5 * (x1 - xm1);
                let c2 = xm1 - 2.5 * x0 + 2.0 * x1 - 0.5 * x2;
                let c3 = 0.5 * (x2 - xm1) + 1.5 * (x0 - x1);
                ((c3 * f + c2) * f + c1) * f + c0
            }
        }
    }
}

/// Converts its input to another block size and sample rate.
///
/// Input blocks are pulled at the input's own clock and appended to a short
/// window; output samples are interpolated from the window at a read position
/// that moves by `input_rate / output_rate` per sample, scaled by the
/// [`IoKey::Rate`] input.
///
/// The window starts filled with the input's initial value, so the output
/// trails the input by [`Resample::LATENCY`] input samples. In exchange a block
/// is only fetched once the read position has used up the previous one, and a
/// shared input is never rendered ahead of the pass that reads it.
pub struct Resample {
    interp: Interp,
    window: Vec<Sample>,
    pos: f64,
    next_input: Option<Clock>,
}

impl Resample {
    /// Input samples the output trails its input by.
    pub const LATENCY: usize = 2;

    pub fn new(interp: Interp) -> Self {
        Self {
            interp,
            window: Vec::new(),
            pos: 1.0,
            next_input: None,
        }
    }

    pub fn unit(
        input: Unit,
        rate: Unit,
        interp: Interp,
        block_size: BlockSize,
        sample_rate: SampleRate,
    ) -> Unit {
        let inputs = Inputs::new()
            .with(IoKey::Generic, input)
            .with(IoKey::Rate, rate);

        Unit::from_inputs(inputs, block_size, sample_rate, |_| {
            Box::new(Resample::new(interp))
        })
    }

    /// Appends the next input block to the window.
    fn fetch(&mut self, ctx: &mut RenderContext, io: &mut Io<'_>) {
        let mut input_ctx = ctx.clone();
        let clock = match self.next_input {
            Some(next) if !next.is_infinite() => next,
            _ => ctx.clock(),
        };
        input_ctx.set_clock(clock);

        let buffer = io.pull(&mut input_ctx, IoKey::Generic);
        let channel = io.channel();
        self.next_input = io
            .inputs()
            .unit(IoKey::Generic)
            .map(|unit| unit.next_timestamp(channel));

        if input_ctx.should_finalize() {
            ctx.set_should_finalize();
        }

        // Keep the samples the interpolator still reads around the read position.
        let consumed = (self.pos.floor() as usize).saturating_sub(1);
        if consumed > 0 {
            self.window.drain(..consumed.min(self.window.len()));
            self.pos -= consumed as f64;
        }
        self.window.extend_from_slice(&buffer.read());
    }
}

impl Processor for Resample {
    fn name(&self) -> &str {
        "Resample"
    }

    fn init_channel(&mut self, channel: usize, inputs: &Inputs) -> Sample {
        let value = inputs.unit(IoKey::Generic).map_or(0.0, |u| u.value(channel));
        self.window.clear();
        self.window.resize(Self::LATENCY + 1, value);
        value
    }

    fn process(&mut self, ctx: &mut RenderContext, io: &mut Io<'_>) {
        let channel = io.channel();
        let len = io.output_len(0);
        let out_rate = io.sample_rate();

        let (input_rate, is_static, value) = match io.inputs().unit(IoKey::Generic) {
            Some(unit) => {
                let node = unit.node(channel);
                (node.sample_rate().get(), node.is_static(), node.value())
            }
            None => (0.0, true, 0.0),
        };

        if input_rate <= 0.0 || is_static {
            io.output(0).fill(value);
            return;
        }

        let multiplier = io.pull(ctx, IoKey::Rate);
        let base_step = input_rate / out_rate;

        for i in 0..len {
            while self.pos.floor() as usize + Self::LATENCY >= self.window.len() {
                self.fetch(ctx, io);
            }

            let sample = self.interp.read(&self.window, self.pos);
            io.output(0)[i] = sample;

            let scale = scaled_sample(&multiplier.read(), i, len) as f64;
            self.pos += (base_step * scale).max(0.0);
        }
    }
}
