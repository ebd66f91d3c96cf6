use crate::buffer::scaled_sample;
use crate::node::{Inputs, Io, IoKey, Node, Processor};
use crate::rate::{BlockSize, SampleRate};
use crate::{RenderContext, Sample, Unit};

/// Sums every channel of its input into one output channel.
pub struct Mixer {
    allow_auto_delete: bool,
}

impl Mixer {
    pub fn new(allow_auto_delete: bool) -> Self {
        Self { allow_auto_delete }
    }

    /// Mono mix of `input`. Without `allow_auto_delete` the mixer is a
    /// barrier: an input finishing does not finalize the mixer.
    pub fn unit(input: Unit, allow_auto_delete: bool) -> Unit {
        let block_size = BlockSize::decide(&input.max_block_size(), &BlockSize::no_preference());
        let sample_rate =
            SampleRate::decide(&input.max_sample_rate(), &SampleRate::no_preference());
        let inputs = Inputs::new().with(IoKey::Generic, input);

        Unit::from_node(Node::new(
            Box::new(Mixer::new(allow_auto_delete)),
            inputs,
            0,
            block_size,
            sample_rate,
        ))
    }
}

impl Processor for Mixer {
    fn name(&self) -> &str {
        if self.allow_auto_delete {
            "Mixer"
        } else {
            "MixBarrier"
        }
    }

    fn init_channel(&mut self, _channel: usize, inputs: &Inputs) -> Sample {
        inputs.unit(IoKey::Generic).map_or(0.0, |unit| {
            (0..unit.num_channels()).map(|c| unit.value(c)).sum()
        })
    }

    fn process(&mut self, ctx: &mut RenderContext, io: &mut Io<'_>) {
        io.output(0).fill(0.0);

        let num_inputs = io
            .inputs()
            .unit(IoKey::Generic)
            .map_or(0, Unit::num_channels);

        for channel in 0..num_inputs {
            let buffer = io.pull_channel(ctx, IoKey::Generic, channel);
            let input = buffer.read();
            let mut out = io.output(0);
            let len = out.len();
            for (i, sample) in out.iter_mut().enumerate() {
                *sample += scaled_sample(&input, i, len);
            }
        }

        if !self.allow_auto_delete {
            ctx.reset_should_finalize();
        }
    }
}
