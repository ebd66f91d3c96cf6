use crate::buffer::scaled_sample;
use crate::node::{Inputs, Io, IoKey, Processor};
use crate::rate::{BlockSize, SampleRate};
use crate::{RenderContext, Sample, Unit};

/// `input * mul + add` in one node.
pub struct MulAdd;

impl MulAdd {
    pub fn unit(input: Unit, mul: Unit, add: Unit) -> Unit {
        let inputs = Inputs::new()
            .with(IoKey::Generic, input)
            .with(IoKey::Multiply, mul)
            .with(IoKey::Add, add);

        // `build`, not `from_inputs`: the operands must stay as inputs.
        Unit::build(
            inputs,
            BlockSize::no_preference(),
            SampleRate::no_preference(),
            |_| Box::new(MulAdd),
        )
    }
}

impl Processor for MulAdd {
    fn name(&self) -> &str {
        "MulAdd"
    }

    fn init_channel(&mut self, channel: usize, inputs: &Inputs) -> Sample {
        let value = |key| inputs.unit(key).map_or(0.0, |u: &Unit| u.value(channel));
        value(IoKey::Generic) * value(IoKey::Multiply) + value(IoKey::Add)
    }

    fn process(&mut self, ctx: &mut RenderContext, io: &mut Io<'_>) {
        let input = io.pull(ctx, IoKey::Generic);
        let mul = io.pull(ctx, IoKey::Multiply);
        let add = io.pull(ctx, IoKey::Add);
        let (input, mul, add) = (input.read(), mul.read(), add.read());

        let mut out = io.output(0);
        let len = out.len();
        for (i, sample) in out.iter_mut().enumerate() {
            *sample = scaled_sample(&input, i, len) * scaled_sample(&mul, i, len)
                + scaled_sample(&add, i, len);
        }
    }
}
