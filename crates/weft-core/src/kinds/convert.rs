use crate::buffer::scaled_sample;
use crate::node::{Inputs, Io, IoKey, Processor};
use crate::rate::{BlockSize, SampleRate};
use crate::{RenderContext, Sample, Unit};
use serde::{Deserialize, Serialize};

/// Storage format a signal is quantized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SampleFormat {
    I16,
    I24,
    I32,
    #[default]
    F32,
}

impl SampleFormat {
    /// Bits per sample.
    pub fn bits(self) -> u32 {
        match self {
            SampleFormat::I16 => 16,
            SampleFormat::I24 => 24,
            SampleFormat::I32 | SampleFormat::F32 => 32,
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, SampleFormat::F32)
    }

    /// `sample` as it reads back after a round trip through this format.
    /// Integer formats clamp to [-1, 1].
    pub fn quantize(self, sample: Sample) -> Sample {
        if !self.is_integer() {
            return sample;
        }

        let scale = ((1u64 << (self.bits() - 1)) - 1) as f64;
        let clamped = sample.clamp(-1.0, 1.0) as f64;
        ((clamped * scale).round() / scale) as Sample
    }
}

/// Quantizes its input to a [`SampleFormat`].
pub struct FormatConvert {
    format: SampleFormat,
}

impl FormatConvert {
    pub fn new(format: SampleFormat) -> Self {
        Self { format }
    }

    pub fn unit(input: Unit, format: SampleFormat) -> Unit {
        let inputs = Inputs::new().with(IoKey::Generic, input);
        Unit::from_inputs(
            inputs,
            BlockSize::no_preference(),
            SampleRate::no_preference(),
            |_| Box::new(FormatConvert::new(format)),
        )
    }
}

impl Processor for FormatConvert {
    fn name(&self) -> &str {
        "Convert"
    }

    fn init_channel(&mut self, channel: usize, inputs: &Inputs) -> Sample {
        let value = inputs.unit(IoKey::Generic).map_or(0.0, |u| u.value(channel));
        self.format.quantize(value)
    }

    fn process(&mut self, ctx: &mut RenderContext, io: &mut Io<'_>) {
        let input = io.pull(ctx, IoKey::Generic);
        let input = input.read();
        let mut out = io.output(0);
        let len = out.len();

        for (i, sample) in out.iter_mut().enumerate() {
            *sample = self.format.quantize(scaled_sample(&input, i, len));
        }
    }
}
