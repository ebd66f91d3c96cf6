//! Node groups: the public composition primitive.
//!
//! A [`Unit`] is an ordered list of shared node handles, one per channel.
//! Units are never empty; the default unit is a single null channel. Channel
//! indices wrap, so a mono unit broadcasts across any wider sibling.

use crate::bus::Bus;
use crate::kinds::{
    BinaryOp, Binary, BusRead, BusWrite, FormatConvert, Interp, Mixer, MulAdd, Param, Resample,
    SampleFormat,
};
use crate::lockfree::AtomicFloat;
use crate::node::{Input, Inputs, IoKey, Node, Processor};
use crate::rate::{BlockSize, Overlap, SampleRate};
use crate::{Buffer, Clock, RenderContext, Sample};
use smallvec::SmallVec;
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::sync::Arc;

/// Ordered group of graph nodes.
#[derive(Clone)]
pub struct Unit {
    channels: Vec<Node>,
}

// Per-channel bookkeeping for `process_into`.
struct Pull {
    ctx: RenderContext,
    written: usize,
    remaining: usize,
}

impl Unit {
    pub fn null() -> Self {
        Self::from_node(Node::null())
    }

    pub fn from_node(node: Node) -> Self {
        Self {
            channels: vec![node],
        }
    }

    /// Group of `nodes`; an empty list gives the null unit.
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        if nodes.is_empty() {
            return Self::null();
        }
        Self { channels: nodes }
    }

    pub fn constant(value: Sample) -> Self {
        Self::from_node(Node::constant(value))
    }

    /// One constant channel per value.
    pub fn from_values(values: &[Sample]) -> Self {
        Self::from_nodes(values.iter().map(|&v| Node::constant(v)).collect())
    }

    /// Instantiates a node kind over `inputs`.
    ///
    /// The unit gets as many channels as the widest input. `make` is called
    /// once per channel. Block size and sample rate are the preferred values,
    /// or the inputs' when the preference is the no-preference sentinel.
    /// [`IoKey::Multiply`] and [`IoKey::Add`] inputs are taken out and folded
    /// onto the result, skipping a multiply by 1 or an add of 0.
    pub fn from_inputs<F>(
        mut inputs: Inputs,
        block_size: BlockSize,
        sample_rate: SampleRate,
        make: F,
    ) -> Self
    where
        F: FnMut(usize) -> Box<dyn Processor>,
    {
        let mul = inputs.remove(IoKey::Multiply);
        let add = inputs.remove(IoKey::Add);
        Self::build(inputs, block_size, sample_rate, make).apply_mul_add(mul, add)
    }

    /// Like [`from_inputs`](Self::from_inputs) for a multi-output kind: one
    /// fan-out owner plus proxies, and the same mul/add folding.
    pub fn proxies_from_inputs(
        mut inputs: Inputs,
        block_size: BlockSize,
        sample_rate: SampleRate,
        processor: Box<dyn Processor>,
    ) -> Self {
        let mul = inputs.remove(IoKey::Multiply);
        let add = inputs.remove(IoKey::Add);
        let block_size = BlockSize::decide(&inputs.max_block_size(), &block_size);
        let sample_rate = SampleRate::decide(&inputs.max_sample_rate(), &sample_rate);

        Self::from_nodes(Node::fan_out(processor, inputs, block_size, sample_rate))
            .apply_mul_add(mul, add)
    }

    pub(crate) fn build<F>(
        inputs: Inputs,
        block_size: BlockSize,
        sample_rate: SampleRate,
        mut make: F,
    ) -> Self
    where
        F: FnMut(usize) -> Box<dyn Processor>,
    {
        let block_size = BlockSize::decide(&inputs.max_block_size(), &block_size);
        let sample_rate = SampleRate::decide(&inputs.max_sample_rate(), &sample_rate);

        let channels = (0..inputs.max_num_channels())
            .map(|channel| {
                Node::new(
                    make(channel),
                    inputs.clone(),
                    channel,
                    block_size.clone(),
                    sample_rate.clone(),
                )
            })
            .collect();

        Self::from_nodes(channels)
    }

    fn apply_mul_add(self, mul: Option<Input>, add: Option<Input>) -> Self {
        let mul = mul
            .and_then(Input::into_unit)
            .filter(|m| !m.is_null() && !m.is_constant_value(1.0));
        let add = add
            .and_then(Input::into_unit)
            .filter(|a| !a.is_null() && !a.is_constant_value(0.0));

        match (mul, add) {
            (None, None) => self,
            (Some(mul), None) => self * mul,
            (None, Some(add)) => self + add,
            (Some(mul), Some(add)) => MulAdd::unit(self, mul, add),
        }
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.channels
    }

    /// Node serving `channel`, wrapping out-of-range indices.
    #[inline]
    pub fn node(&self, channel: usize) -> Node {
        self.channels[channel % self.channels.len()].channel(channel)
    }

    /// Single-channel unit holding channel `channel` (wrapped).
    pub fn channel(&self, channel: usize) -> Unit {
        Self::from_node(self.node(channel))
    }

    /// Replaces channel `channel` (wrapped). The new node must not depend on
    /// this unit, or rendering recurses into itself.
    pub fn put(&mut self, channel: usize, node: Node) {
        let len = self.channels.len();
        self.channels[channel % len] = node;
    }

    /// Channels of `self` followed by channels of `other`.
    pub fn concat(&self, other: &Unit) -> Unit {
        let mut channels = self.channels.clone();
        channels.extend(other.channels.iter().cloned());
        Self::from_nodes(channels)
    }

    /// True for the single-channel null unit.
    pub fn is_null(&self) -> bool {
        self.channels.len() == 1 && self.channels[0].is_null()
    }

    /// True for a single-channel constant unit.
    pub fn is_constant(&self) -> bool {
        self.channels.len() == 1 && self.channels[0].is_constant()
    }

    pub fn is_null_at(&self, channel: usize) -> bool {
        self.node(channel).is_null()
    }

    pub fn is_constant_at(&self, channel: usize) -> bool {
        self.node(channel).is_constant()
    }

    /// True for a single-channel constant holding exactly `value`.
    pub fn is_constant_value(&self, value: Sample) -> bool {
        self.is_constant() && self.channels[0].value() == value
    }

    pub fn value(&self, channel: usize) -> Sample {
        self.node(channel).value()
    }

    pub fn output_buffer(&self, channel: usize) -> Buffer {
        self.node(channel).output_buffer()
    }

    pub fn next_timestamp(&self, channel: usize) -> Clock {
        self.node(channel).next_timestamp()
    }

    pub fn block_size(&self, channel: usize) -> BlockSize {
        self.node(channel).block_size()
    }

    pub fn sample_rate(&self, channel: usize) -> SampleRate {
        self.node(channel).sample_rate()
    }

    pub fn max_block_size(&self) -> BlockSize {
        self.pick_block_size(|candidate, best| candidate > best)
    }

    pub fn min_block_size(&self) -> BlockSize {
        self.pick_block_size(|candidate, best| candidate < best)
    }

    pub fn max_sample_rate(&self) -> SampleRate {
        self.pick_sample_rate(|candidate, best| candidate > best)
    }

    pub fn min_sample_rate(&self) -> SampleRate {
        self.pick_sample_rate(|candidate, best| candidate < best)
    }

    fn pick_block_size(&self, better: impl Fn(usize, usize) -> bool) -> BlockSize {
        let mut best = self.channels[0].block_size();
        for node in &self.channels[1..] {
            let candidate = node.block_size();
            if better(candidate.get(), best.get()) {
                best = candidate;
            }
        }
        best
    }

    fn pick_sample_rate(&self, better: impl Fn(f64, f64) -> bool) -> SampleRate {
        let mut best = self.channels[0].sample_rate();
        for node in &self.channels[1..] {
            let candidate = node.sample_rate();
            if better(candidate.get(), best.get()) {
                best = candidate;
            }
        }
        best
    }

    pub fn channels_have_same_block_size(&self) -> bool {
        let first = self.channels[0].block_size().get();
        self.channels.iter().all(|n| n.block_size().get() == first)
    }

    pub fn channels_have_same_sample_rate(&self) -> bool {
        let first = self.channels[0].sample_rate().get();
        self.channels.iter().all(|n| n.sample_rate().get() == first)
    }

    pub fn set_block_size(&self, block_size: BlockSize) {
        for node in &self.channels {
            node.set_block_size(block_size.clone());
        }
    }

    pub fn set_sample_rate(&self, sample_rate: SampleRate) {
        for node in &self.channels {
            node.set_sample_rate(sample_rate.clone());
        }
    }

    pub fn set_overlap(&self, overlap: Overlap) {
        for node in &self.channels {
            node.set_overlap(overlap.clone());
        }
    }

    /// Collapses the unit to the null node.
    pub fn set_to_null(&mut self) {
        self.channels.clear();
        self.channels.push(Node::null());
    }

    /// True when every channel is the same node as in `other`.
    pub fn same_nodes(&self, other: &Unit) -> bool {
        self.channels.len() == other.channels.len()
            && self
                .channels
                .iter()
                .zip(&other.channels)
                .all(|(a, b)| a.ptr_eq(b))
    }

    fn swap_expired(&mut self, clock: Clock) -> bool {
        let expired = self
            .channels
            .iter()
            .find(|node| node.should_be_deleted_now(clock))
            .cloned();

        match expired {
            Some(node) => {
                tracing::debug!("{} expired at {}, unit replaced by null", node.label(), clock);
                self.set_to_null();
                true
            }
            None => false,
        }
    }

    /// Renders `channel` for `ctx` and returns its output buffer.
    ///
    /// An expired channel turns the whole unit into the null unit first.
    pub fn process(&mut self, ctx: &mut RenderContext, channel: usize) -> Buffer {
        if self.node(channel).should_be_deleted_now(ctx.clock()) {
            self.swap_expired(ctx.clock());
        }

        let node = self.node(channel);
        node.process(ctx, channel);
        node.output_buffer()
    }

    /// Renders every channel for `ctx`.
    pub fn process_all(&mut self, ctx: &mut RenderContext) {
        self.swap_expired(ctx.clock());

        for channel in 0..self.channels.len() {
            self.channels[channel].process(ctx, channel);
        }
    }

    /// Pulls enough blocks to fill every destination slice, starting at `ctx`.
    ///
    /// Each destination channel gets its own copy of `ctx` and its own count
    /// of samples still needed, because channels may run at different block
    /// sizes and rates. Channels are pulled round-robin, one block at a time,
    /// so a fan-out owner and its proxies stay on the same block.
    pub fn process_into(&mut self, ctx: &RenderContext, destinations: &mut [&mut [Sample]]) {
        self.swap_expired(ctx.clock());

        let mut pulls: SmallVec<[Pull; 8]> = destinations
            .iter()
            .map(|dest| Pull {
                ctx: ctx.clone(),
                written: 0,
                remaining: dest.len(),
            })
            .collect();

        loop {
            let mut pending = false;
            let mut progressed = false;

            for (channel, dest) in destinations.iter_mut().enumerate() {
                let pull = &mut pulls[channel];
                if pull.remaining == 0 {
                    continue;
                }

                // A finalize request belongs to the sub-pull that raised it.
                pull.ctx.reset_should_finalize();
                Self::snap_to_next(&self.node(channel), &mut pull.ctx);
                if self.node(channel).should_be_deleted_now(pull.ctx.clock()) {
                    self.swap_expired(pull.ctx.clock());
                }

                let node = self.node(channel);
                if node.is_static() {
                    dest[pull.written..].fill(node.value());
                    pull.written += pull.remaining;
                    pull.remaining = 0;
                    progressed = true;
                    continue;
                }

                let copied = Self::pull_block(&node, channel, pull, dest);
                progressed |= copied > 0;
                pending |= pull.remaining > 0;
            }

            if !pending {
                break;
            }

            if !progressed {
                for (dest, pull) in destinations.iter_mut().zip(&mut pulls) {
                    dest[pull.written..].fill(0.0);
                    pull.remaining = 0;
                }
                break;
            }
        }
    }

    /// Partial reads leave a channel clock a rounding error short of `next`.
    fn snap_to_next(node: &Node, ctx: &mut RenderContext) {
        let next = node.next_timestamp();
        let rate = node.sample_rate().get();
        if !next.is_infinite() && (next - ctx.clock()).to_samples(rate).abs() < 0.5 {
            ctx.set_clock(next);
        }
    }

    /// One sub-pull for one channel. Returns the number of samples copied.
    fn pull_block(node: &Node, channel: usize, pull: &mut Pull, dest: &mut [Sample]) -> usize {
        let rate = node.sample_rate().get();

        node.process(&mut pull.ctx, channel);

        let buffer = node.output_buffer();
        let data = buffer.read();
        let offset = (pull.ctx.clock() - node.last_timestamp())
            .to_samples(rate)
            .round();
        let offset = if offset > 0.0 { offset as usize } else { 0 };

        if offset >= data.len() {
            return 0;
        }

        let count = (data.len() - offset).min(pull.remaining);
        dest[pull.written..pull.written + count].copy_from_slice(&data[offset..offset + count]);
        pull.written += count;
        pull.remaining -= count;
        pull.ctx.advance_samples(count, rate);
        count
    }

    /// Applies `op` channel-wise with `rhs`.
    pub fn binary(&self, op: BinaryOp, rhs: &Unit) -> Unit {
        Binary::unit(op, self.clone(), rhs.clone())
    }

    pub fn min(&self, rhs: &Unit) -> Unit {
        self.binary(BinaryOp::Min, rhs)
    }

    pub fn max(&self, rhs: &Unit) -> Unit {
        self.binary(BinaryOp::Max, rhs)
    }

    /// `self * mul + add`, folding away a multiply by 1 and an add of 0.
    pub fn mul_add(&self, mul: &Unit, add: &Unit) -> Unit {
        self.clone()
            .apply_mul_add(Some(mul.clone().into()), Some(add.clone().into()))
    }

    /// Resamples to the default block size and sample rate.
    pub fn ar(&self, interp: Interp) -> Unit {
        self.ar_with(interp, BlockSize::default_size(), SampleRate::default_rate())
    }

    /// Resamples to `block_size` and `sample_rate`.
    pub fn ar_with(&self, interp: Interp, block_size: BlockSize, sample_rate: SampleRate) -> Unit {
        Resample::unit(self.clone(), Unit::constant(1.0), interp, block_size, sample_rate)
    }

    /// Resamples to the control rate: one sample per default-size block.
    pub fn kr(&self, interp: Interp) -> Unit {
        self.ar_with(interp, BlockSize::control_rate(), SampleRate::control_rate())
    }

    /// Sums every channel into one.
    pub fn mix(&self) -> Unit {
        Mixer::unit(self.clone(), true)
    }

    /// Like [`mix`](Self::mix), but finalize requests from the inputs stop
    /// here instead of expiring the mixer too.
    pub fn mix_barrier(&self) -> Unit {
        Mixer::unit(self.clone(), false)
    }

    /// Quantizes every channel to `format`.
    pub fn convert(&self, format: SampleFormat) -> Unit {
        FormatConvert::unit(self.clone(), format)
    }

    /// Writes channel `i` into `busses[i % len]` and passes the signal on.
    pub fn write_busses(&self, busses: Vec<Bus>) -> Unit {
        BusWrite::unit(self.clone(), busses)
    }

    /// One channel per bus, reading at `block_size`.
    pub fn read_busses(busses: &[Bus], block_size: BlockSize) -> Unit {
        BusRead::unit(busses, block_size)
    }

    /// Smoothed audio-rate signal following a control-thread cell.
    pub fn param(cell: Arc<AtomicFloat>, smooth_secs: f32) -> Unit {
        Param::unit(cell, smooth_secs, BlockSize::default_size(), SampleRate::default_rate())
    }
}

impl Default for Unit {
    fn default() -> Self {
        Self::null()
    }
}

impl From<Node> for Unit {
    fn from(node: Node) -> Self {
        Self::from_node(node)
    }
}

impl From<Sample> for Unit {
    fn from(value: Sample) -> Self {
        Self::constant(value)
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.channels).finish()
    }
}

macro_rules! unit_operator {
    ($trait:ident, $method:ident, $op:expr) => {
        impl $trait<Unit> for Unit {
            type Output = Unit;

            fn $method(self, rhs: Unit) -> Unit {
                Binary::unit($op, self, rhs)
            }
        }

        impl $trait<&Unit> for &Unit {
            type Output = Unit;

            fn $method(self, rhs: &Unit) -> Unit {
                Binary::unit($op, self.clone(), rhs.clone())
            }
        }

        impl $trait<Sample> for Unit {
            type Output = Unit;

            fn $method(self, rhs: Sample) -> Unit {
                Binary::unit($op, self, Unit::constant(rhs))
            }
        }
    };
}

unit_operator!(Add, add, BinaryOp::Add);
unit_operator!(Sub, sub, BinaryOp::Sub);
unit_operator!(Mul, mul, BinaryOp::Mul);
unit_operator!(Div, div, BinaryOp::Div);
