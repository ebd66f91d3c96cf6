use crate::lockfree::AtomicFloat;
use crate::node::{Inputs, Io, Node, Processor};
use crate::rate::{BlockSize, SampleRate};
use crate::{RenderContext, Sample, SmoothedValue, Unit};
use std::sync::Arc;

/// Audio-rate signal following a cell written by the control thread.
///
/// The cell is read once per block and the output ramps to the new value, so
/// the writer never blocks and the signal never steps.
pub struct Param {
    cell: Arc<AtomicFloat>,
    smoother: SmoothedValue,
}

impl Param {
    pub fn new(cell: Arc<AtomicFloat>, smooth_secs: f32, sample_rate: f64) -> Self {
        let smoother = SmoothedValue::new(cell.get(), smooth_secs, sample_rate);
        Self { cell, smoother }
    }

    pub fn unit(
        cell: Arc<AtomicFloat>,
        smooth_secs: f32,
        block_size: BlockSize,
        sample_rate: SampleRate,
    ) -> Unit {
        let param = Param::new(cell, smooth_secs, sample_rate.get());
        Unit::from_node(Node::new(
            Box::new(param),
            Inputs::new(),
            0,
            block_size,
            sample_rate,
        ))
    }
}

impl Processor for Param {
    fn name(&self) -> &str {
        "Param"
    }

    fn init_channel(&mut self, _channel: usize, _inputs: &Inputs) -> Sample {
        self.cell.get()
    }

    fn process(&mut self, _ctx: &mut RenderContext, io: &mut Io<'_>) {
        self.smoother.set_target(self.cell.get_unchecked());
        self.smoother.fill(&mut io.output(0));
    }
}
