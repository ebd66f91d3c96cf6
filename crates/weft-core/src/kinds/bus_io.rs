use crate::buffer::scaled_sample;
use crate::node::{Inputs, Io, IoKey, Node, Processor};
use crate::rate::{BlockSize, SampleRate};
use crate::{Bus, Clock, RenderContext, Sample, Unit};

/// Writes its input into a bus at the render clock and passes it through.
pub struct BusWrite;

impl BusWrite {
    /// Channel `i` of `input` goes to `busses[i % len]`.
    pub fn unit(input: Unit, busses: Vec<Bus>) -> Unit {
        if busses.is_empty() {
            return input;
        }

        let inputs = Inputs::new()
            .with(IoKey::Generic, input)
            .with(IoKey::Busses, busses);

        Unit::from_inputs(
            inputs,
            BlockSize::no_preference(),
            SampleRate::no_preference(),
            |_| Box::new(BusWrite),
        )
    }
}

impl Processor for BusWrite {
    fn name(&self) -> &str {
        "BusWrite"
    }

    fn init_channel(&mut self, channel: usize, inputs: &Inputs) -> Sample {
        inputs.unit(IoKey::Generic).map_or(0.0, |u| u.value(channel))
    }

    fn process(&mut self, ctx: &mut RenderContext, io: &mut Io<'_>) {
        let channel = io.channel();
        let input = io.pull(ctx, IoKey::Generic);
        let input = input.read();

        let bus = io
            .inputs()
            .busses(IoKey::Busses)
            .filter(|busses| !busses.is_empty())
            .map(|busses| busses[channel % busses.len()].clone());
        if let Some(bus) = bus {
            bus.write(ctx.clock(), &input);
        }

        let mut out = io.output(0);
        let len = out.len();
        for (i, sample) in out.iter_mut().enumerate() {
            *sample = scaled_sample(&input, i, len);
        }
    }
}

/// Reads a bus into its output.
///
/// The read cursor starts at the first clock the node renders at. When the
/// writer is behind, the cursor waits for it; when the reader has fallen out
/// of the buffer, the cursor keeps moving so the bus can grow to catch it.
pub struct BusRead {
    bus: Bus,
    cursor: Option<Clock>,
}

impl BusRead {
    pub fn new(bus: Bus) -> Self {
        Self { bus, cursor: None }
    }

    /// One channel per bus, each at its bus's sample rate.
    pub fn unit(busses: &[Bus], block_size: BlockSize) -> Unit {
        let nodes = busses
            .iter()
            .enumerate()
            .map(|(channel, bus)| {
                Node::new(
                    Box::new(BusRead::new(bus.clone())),
                    Inputs::new().with(IoKey::Busses, bus.clone()),
                    channel,
                    block_size.clone(),
                    bus.sample_rate(),
                )
            })
            .collect();

        Unit::from_nodes(nodes)
    }
}

impl Processor for BusRead {
    fn name(&self) -> &str {
        "BusRead"
    }

    fn process(&mut self, ctx: &mut RenderContext, io: &mut Io<'_>) {
        let mut cursor = self.cursor.unwrap_or_else(|| ctx.clock());
        let mut out = io.output(0);

        if !self.bus.read(&mut cursor, &mut out) {
            let span = Clock::ticks_for_samples(out.len() as f64, io.sample_rate());
            if cursor + span <= self.bus.latest_valid() {
                cursor += span;
            }
        }

        self.cursor = Some(cursor);
    }
}
