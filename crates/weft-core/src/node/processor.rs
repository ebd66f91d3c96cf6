use super::{IoKey, Inputs, Node};
use crate::{Buffer, RenderContext, Sample};
use std::cell::RefMut;

/// The computation behind a graph node.
///
/// Implementations only fill output buffers. Memoization, timestamps, rate
/// bookkeeping and fan-out are handled by [`Node`], so none of
/// that differs between node kinds.
pub trait Processor: 'static {
    /// Label used in logs and node names.
    fn name(&self) -> &str;

    /// Outputs per instance. Anything above 1 makes the node a fan-out owner.
    fn num_outputs(&self) -> usize {
        1
    }

    /// Called once when a node is built for `channel`. Returns the initial
    /// output value, which is what downstream nodes see before the first render.
    fn init_channel(&mut self, _channel: usize, _inputs: &Inputs) -> Sample {
        0.0
    }

    /// Renders one block into `io`'s outputs.
    fn process(&mut self, ctx: &mut RenderContext, io: &mut Io<'_>);
}

/// What a [`Processor`] sees during one render.
pub struct Io<'a> {
    inputs: &'a mut Inputs,
    outputs: &'a [Buffer],
    channel: usize,
    sample_rate: f64,
}

impl<'a> Io<'a> {
    pub(crate) fn new(
        inputs: &'a mut Inputs,
        outputs: &'a [Buffer],
        channel: usize,
        sample_rate: f64,
    ) -> Self {
        Self {
            inputs,
            outputs,
            channel,
            sample_rate,
        }
    }

    /// Channel index this render was requested for.
    #[inline]
    pub fn channel(&self) -> usize {
        self.channel
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    #[inline]
    pub fn inputs(&mut self) -> &mut Inputs {
        self.inputs
    }

    #[inline]
    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Block length of output `index`.
    #[inline]
    pub fn output_len(&self, index: usize) -> usize {
        self.outputs[index].len()
    }

    #[inline]
    pub fn output(&self, index: usize) -> RefMut<'_, [Sample]> {
        self.outputs[index].write()
    }

    /// Renders input `key` for this channel and returns its buffer.
    ///
    /// A missing input reads as a single silent sample.
    pub fn pull(&mut self, ctx: &mut RenderContext, key: IoKey) -> Buffer {
        let channel = self.channel;
        self.pull_channel(ctx, key, channel)
    }

    /// Like [`pull`](Self::pull) for an explicit input channel.
    pub fn pull_channel(&mut self, ctx: &mut RenderContext, key: IoKey, channel: usize) -> Buffer {
        match self.inputs.unit_mut(key) {
            Some(unit) => unit.process(ctx, channel),
            None => Node::null().output_buffer(),
        }
    }
}
