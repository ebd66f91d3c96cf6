//! Graph nodes.
//!
//! A [`Node`] owns one output buffer, a block size / sample rate / overlap
//! triple, its named [`Inputs`] and three timestamps:
//!
//! - `last`: clock of the most recent render;
//! - `next`: earliest clock at which the node renders again;
//! - `expiry`: clock from which the owning [`Unit`](crate::Unit) swaps the
//!   node for the null node.
//!
//! [`Node::process`] renders only when the render clock has reached `next`.
//! A node reached along several paths in one pass therefore renders once,
//! whatever the fan-in.
//!
//! Multi-output processors become a fan-out owner plus proxies. The owner is
//! channel 0 and renders every output; each proxy forwards to the owner and
//! exposes one of its buffers. Proxies hold the owner strongly, the owner holds
//! its proxies weakly, so keeping any single channel alive keeps the owner
//! alive without a reference cycle.

mod inputs;
mod processor;

pub use inputs::{Input, Inputs, IoKey};
pub use processor::{Io, Processor};

use crate::rate::{BlockSize, Overlap, SampleRate};
use crate::{Buffer, Clock, RenderContext, Sample, Unit};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Where a node is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Never rendered.
    Uninitialised,
    Live,
    /// Past its expiry; the owning unit replaces it on the next pull.
    Expired,
}

// `last` before the first render.
const NEVER: Clock = Clock::from_ticks(-1);

struct NodeCore {
    label: String,
    output: Buffer,
    block_size: BlockSize,
    sample_rate: SampleRate,
    overlap: Overlap,
    inputs: Inputs,
    last: Clock,
    next: Clock,
    expiry: Clock,
}

impl NodeCore {
    fn new(label: String, block_size: BlockSize, sample_rate: SampleRate, inputs: Inputs) -> Self {
        Self {
            label,
            output: Buffer::new(block_size.get().max(1)),
            block_size,
            sample_rate,
            overlap: Overlap::none(),
            inputs,
            last: NEVER,
            next: Clock::ZERO,
            expiry: Clock::MAX,
        }
    }

    #[inline]
    fn block_len(&self) -> usize {
        self.block_size.get().max(1)
    }

    /// Ticks between renders.
    fn block_duration(&self) -> f64 {
        let samples = self.block_size.get() as f64 * self.overlap.get();
        Clock::ticks_for_samples(samples, self.sample_rate.get())
    }

    fn mark_rendered(&mut self, ctx: &RenderContext) {
        self.last = ctx.clock();

        if self.last >= Clock::ZERO {
            let next = self.last + self.block_duration();
            debug_assert!(
                next > self.last,
                "{} did not advance past {:?}",
                self.label,
                self.last
            );
            self.next = next;
        }

        if ctx.should_finalize() {
            self.expiry = self.next;
        }
    }
}

struct FanOut {
    processor: Box<dyn Processor>,
    /// One per output; `buffers[0]` is the owner's own output.
    buffers: Vec<Buffer>,
    /// Proxies for outputs `1..`.
    proxies: Vec<Weak<RefCell<NodeState>>>,
}

enum NodeKind {
    Null,
    Constant,
    Computed(Box<dyn Processor>),
    Owner(FanOut),
    Proxy { owner: Node, index: usize },
}

struct NodeState {
    core: NodeCore,
    kind: NodeKind,
}

impl NodeState {
    fn is_static(&self) -> bool {
        matches!(self.kind, NodeKind::Null | NodeKind::Constant)
    }

    fn live_proxies(&self) -> Vec<Node> {
        match &self.kind {
            NodeKind::Owner(fan) => fan
                .proxies
                .iter()
                .filter_map(Weak::upgrade)
                .map(Node)
                .collect(),
            _ => Vec::new(),
        }
    }

    fn fit_outputs(&mut self) {
        let len = self.core.block_len();
        self.core.output.resize(len);
        if let NodeKind::Owner(fan) = &self.kind {
            for buffer in &fan.buffers {
                buffer.resize(len);
            }
        }
    }
}

thread_local! {
    static NULL: Node = Node::static_node("Null".to_owned(), 0.0, NodeKind::Null);
}

/// Shared handle to a graph node.
#[derive(Clone)]
pub struct Node(Rc<RefCell<NodeState>>);

impl Node {
    /// The shared null node: silent, never renders, never expires.
    pub fn null() -> Node {
        NULL.with(Node::clone)
    }

    /// A static node holding `value`.
    pub fn constant(value: Sample) -> Node {
        Self::static_node(format!("Constant({value})"), value, NodeKind::Constant)
    }

    fn static_node(label: String, value: Sample, kind: NodeKind) -> Node {
        let mut core = NodeCore::new(
            label,
            BlockSize::control_rate(),
            SampleRate::control_rate(),
            Inputs::new(),
        );
        core.output = Buffer::from_vec(vec![value]);
        core.next = Clock::MAX;
        Self::from_parts(core, kind)
    }

    fn from_parts(core: NodeCore, kind: NodeKind) -> Node {
        Node(Rc::new(RefCell::new(NodeState { core, kind })))
    }

    /// A single-output node computing `processor` for `channel`.
    pub fn new(
        mut processor: Box<dyn Processor>,
        inputs: Inputs,
        channel: usize,
        block_size: BlockSize,
        sample_rate: SampleRate,
    ) -> Node {
        debug_assert_eq!(
            processor.num_outputs(),
            1,
            "{} has several outputs, build it with Node::fan_out",
            processor.name()
        );

        let initial = processor.init_channel(channel, &inputs);
        let mut core = NodeCore::new(processor.name().to_owned(), block_size, sample_rate, inputs);
        core.output = Buffer::from_vec(vec![initial; core.block_len()]);
        Self::from_parts(core, NodeKind::Computed(processor))
    }

    /// A fan-out owner for a multi-output `processor`.
    ///
    /// Returns one node per output: the owner first, then its proxies.
    pub fn fan_out(
        mut processor: Box<dyn Processor>,
        inputs: Inputs,
        block_size: BlockSize,
        sample_rate: SampleRate,
    ) -> Vec<Node> {
        let outputs = processor.num_outputs().max(1);
        let initial = processor.init_channel(0, &inputs);
        let name = processor.name().to_owned();
        let len = block_size.get().max(1);

        let buffers: Vec<Buffer> = (0..outputs)
            .map(|_| Buffer::from_vec(vec![initial; len]))
            .collect();

        let mut core = NodeCore::new(name.clone(), block_size.clone(), sample_rate.clone(), inputs);
        core.output = buffers[0].clone();

        let owner = Self::from_parts(
            core,
            NodeKind::Owner(FanOut {
                processor,
                buffers: buffers.clone(),
                proxies: Vec::with_capacity(outputs - 1),
            }),
        );

        let mut channels = Vec::with_capacity(outputs);
        channels.push(owner.clone());

        for (index, buffer) in buffers.into_iter().enumerate().skip(1) {
            let mut core = NodeCore::new(
                format!("Proxy ({name} channel {index})"),
                block_size.clone(),
                sample_rate.clone(),
                Inputs::new(),
            );
            core.output = buffer;
            channels.push(Self::from_parts(
                core,
                NodeKind::Proxy {
                    owner: owner.clone(),
                    index,
                },
            ));
        }

        if let NodeKind::Owner(fan) = &mut owner.0.borrow_mut().kind {
            fan.proxies = channels[1..].iter().map(|p| Rc::downgrade(&p.0)).collect();
        }

        channels
    }

    /// Renders for `channel` if `ctx.clock()` has reached the next render time.
    pub fn process(&self, ctx: &mut RenderContext, channel: usize) {
        let mut state = self.0.borrow_mut();
        if ctx.clock() < state.core.next {
            return;
        }

        let forward = match &state.kind {
            NodeKind::Proxy { owner, index } => Some((owner.clone(), *index)),
            _ => None,
        };
        if let Some((owner, index)) = forward {
            drop(state);
            owner.process(ctx, index);
            self.0.borrow_mut().core.mark_rendered(ctx);
            return;
        }

        state.fit_outputs();
        let NodeState { core, kind } = &mut *state;
        let sample_rate = core.sample_rate.get();

        match kind {
            NodeKind::Null | NodeKind::Constant | NodeKind::Proxy { .. } => return,
            NodeKind::Computed(processor) => {
                let outputs = std::slice::from_ref(&core.output);
                let mut io = Io::new(&mut core.inputs, outputs, channel, sample_rate);
                processor.process(ctx, &mut io);
            }
            NodeKind::Owner(fan) => {
                let mut io = Io::new(&mut core.inputs, &fan.buffers, channel, sample_rate);
                fan.processor.process(ctx, &mut io);
            }
        }

        core.mark_rendered(ctx);
    }

    /// Node serving `channel`. Every node serves all of its channels itself;
    /// on a fan-out owner this is the owner whichever index is asked for.
    #[inline]
    pub fn channel(&self, _channel: usize) -> Node {
        self.clone()
    }

    /// Owner of a proxy.
    pub fn owner(&self) -> Option<Node> {
        match &self.0.borrow().kind {
            NodeKind::Proxy { owner, .. } => Some(owner.clone()),
            _ => None,
        }
    }

    /// Live proxies of an owner, in output order. Dropped proxies are skipped.
    pub fn proxies(&self) -> Vec<Node> {
        self.0.borrow().live_proxies()
    }

    /// Outputs this node currently serves: 1, or 1 plus live proxies for an owner.
    pub fn num_channels(&self) -> usize {
        1 + self.proxies().len()
    }

    pub fn label(&self) -> String {
        self.0.borrow().core.label.clone()
    }

    /// Current scalar value: the last sample of the output buffer.
    pub fn value(&self) -> Sample {
        self.0.borrow().core.output.last()
    }

    pub fn init_value(&self, value: Sample) {
        self.0.borrow().core.output.set_last(value);
    }

    pub fn output_buffer(&self) -> Buffer {
        self.0.borrow().core.output.clone()
    }

    pub fn block_size(&self) -> BlockSize {
        self.0.borrow().core.block_size.clone()
    }

    pub fn sample_rate(&self) -> SampleRate {
        self.0.borrow().core.sample_rate.clone()
    }

    pub fn overlap(&self) -> Overlap {
        self.0.borrow().core.overlap.clone()
    }

    /// Replaces the block size handle. Owners pass it on to live proxies.
    pub fn set_block_size(&self, block_size: BlockSize) {
        let proxies = {
            let mut state = self.0.borrow_mut();
            if matches!(state.kind, NodeKind::Null) {
                return;
            }
            state.core.block_size = block_size.clone();
            state.fit_outputs();
            state.live_proxies()
        };

        for proxy in proxies {
            proxy.set_block_size(block_size.clone());
        }
    }

    /// Replaces the sample rate handle. Owners pass it on to live proxies.
    pub fn set_sample_rate(&self, sample_rate: SampleRate) {
        let proxies = {
            let mut state = self.0.borrow_mut();
            if matches!(state.kind, NodeKind::Null) {
                return;
            }
            state.core.sample_rate = sample_rate.clone();
            state.live_proxies()
        };

        for proxy in proxies {
            proxy.set_sample_rate(sample_rate.clone());
        }
    }

    /// Replaces the overlap handle. Owners pass it on to live proxies.
    pub fn set_overlap(&self, overlap: Overlap) {
        let proxies = {
            let mut state = self.0.borrow_mut();
            if matches!(state.kind, NodeKind::Null) {
                return;
            }
            state.core.overlap = overlap.clone();
            state.live_proxies()
        };

        for proxy in proxies {
            proxy.set_overlap(overlap.clone());
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.0.borrow().kind, NodeKind::Null)
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.0.borrow().kind, NodeKind::Constant)
    }

    /// Null or constant: never renders.
    pub fn is_static(&self) -> bool {
        self.0.borrow().is_static()
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self.0.borrow().kind, NodeKind::Proxy { .. })
    }

    pub fn is_proxy_owner(&self) -> bool {
        matches!(self.0.borrow().kind, NodeKind::Owner(_))
    }

    pub fn should_be_deleted_now(&self, clock: Clock) -> bool {
        clock >= self.0.borrow().core.expiry
    }

    pub fn last_timestamp(&self) -> Clock {
        self.0.borrow().core.last
    }

    pub fn next_timestamp(&self) -> Clock {
        self.0.borrow().core.next
    }

    pub fn expiry_timestamp(&self) -> Clock {
        self.0.borrow().core.expiry
    }

    /// Ticks between renders at the current rates.
    pub fn block_duration(&self) -> f64 {
        self.0.borrow().core.block_duration()
    }

    pub fn lifecycle(&self, clock: Clock) -> Lifecycle {
        let state = self.0.borrow();
        if clock >= state.core.expiry {
            Lifecycle::Expired
        } else if state.core.last < Clock::ZERO && !state.is_static() {
            Lifecycle::Uninitialised
        } else {
            Lifecycle::Live
        }
    }

    /// Unit plugged into input `key`, if any.
    pub fn input_unit(&self, key: IoKey) -> Option<Unit> {
        self.0.borrow().core.inputs.unit(key).cloned()
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(state) => f.debug_tuple("Node").field(&state.core.label).finish(),
            Err(_) => f.write_str("Node(<rendering>)"),
        }
    }
}
