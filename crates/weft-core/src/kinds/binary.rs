use crate::buffer::scaled_sample;
use crate::node::{Inputs, Io, IoKey, Processor};
use crate::rate::{BlockSize, SampleRate};
use crate::{RenderContext, Sample, Unit};

/// Channel-wise arithmetic between two units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,
}

impl BinaryOp {
    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "Add",
            BinaryOp::Sub => "Sub",
            BinaryOp::Mul => "Mul",
            BinaryOp::Div => "Div",
            BinaryOp::Min => "Min",
            BinaryOp::Max => "Max",
        }
    }

    /// Division by zero yields 0.
    #[inline]
    pub fn apply(self, a: Sample, b: Sample) -> Sample {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div if b == 0.0 => 0.0,
            BinaryOp::Div => a / b,
            BinaryOp::Min => a.min(b),
            BinaryOp::Max => a.max(b),
        }
    }
}

pub struct Binary {
    op: BinaryOp,
}

impl Binary {
    pub fn new(op: BinaryOp) -> Self {
        Self { op }
    }

    /// `left op right`, running at the faster of the two inputs.
    pub fn unit(op: BinaryOp, left: Unit, right: Unit) -> Unit {
        let inputs = Inputs::new()
            .with(IoKey::LeftOperand, left)
            .with(IoKey::RightOperand, right);

        Unit::build(
            inputs,
            BlockSize::no_preference(),
            SampleRate::no_preference(),
            |_| Box::new(Binary::new(op)),
        )
    }
}

impl Processor for Binary {
    fn name(&self) -> &str {
        self.op.name()
    }

    fn init_channel(&mut self, channel: usize, inputs: &Inputs) -> Sample {
        let left = inputs.unit(IoKey::LeftOperand).map_or(0.0, |u| u.value(channel));
        let right = inputs.unit(IoKey::RightOperand).map_or(0.0, |u| u.value(channel));
        self.op.apply(left, right)
    }

    fn process(&mut self, ctx: &mut RenderContext, io: &mut Io<'_>) {
        let left = io.pull(ctx, IoKey::LeftOperand);
        let right = io.pull(ctx, IoKey::RightOperand);
        let (left, right) = (left.read(), right.read());

        let mut out = io.output(0);
        let len = out.len();
        for (i, sample) in out.iter_mut().enumerate() {
            *sample = self
                .op
                .apply(scaled_sample(&left, i, len), scaled_sample(&right, i, len));
        }
    }
}
