use crate::rate::{BlockSize, SampleRate};
use crate::{Bus, Unit};
use hashbrown::HashMap;

/// Name of a node input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoKey {
    Generic,
    LeftOperand,
    RightOperand,
    Multiply,
    Add,
    Busses,
    Rate,
    Named(&'static str),
}

/// A value plugged into a node input.
#[derive(Clone, Debug)]
pub enum Input {
    Unit(Unit),
    Busses(Vec<Bus>),
}

impl Input {
    pub fn into_unit(self) -> Option<Unit> {
        match self {
            Input::Unit(unit) => Some(unit),
            Input::Busses(_) => None,
        }
    }
}

impl From<Unit> for Input {
    fn from(unit: Unit) -> Self {
        Input::Unit(unit)
    }
}

impl From<Bus> for Input {
    fn from(bus: Bus) -> Self {
        Input::Busses(vec![bus])
    }
}

impl From<Vec<Bus>> for Input {
    fn from(busses: Vec<Bus>) -> Self {
        Input::Busses(busses)
    }
}

/// Named inputs of a node.
///
/// Every channel built from the same inputs gets its own clone; the units
/// inside are shared handles, so cloning is cheap.
#[derive(Clone, Default, Debug)]
pub struct Inputs {
    map: HashMap<IoKey, Input>,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, key: IoKey, input: impl Into<Input>) -> Self {
        self.insert(key, input);
        self
    }

    pub fn insert(&mut self, key: IoKey, input: impl Into<Input>) {
        self.map.insert(key, input.into());
    }

    pub fn remove(&mut self, key: IoKey) -> Option<Input> {
        self.map.remove(&key)
    }

    pub fn contains(&self, key: IoKey) -> bool {
        self.map.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn unit(&self, key: IoKey) -> Option<&Unit> {
        match self.map.get(&key)? {
            Input::Unit(unit) => Some(unit),
            Input::Busses(_) => None,
        }
    }

    pub fn unit_mut(&mut self, key: IoKey) -> Option<&mut Unit> {
        match self.map.get_mut(&key)? {
            Input::Unit(unit) => Some(unit),
            Input::Busses(_) => None,
        }
    }

    pub fn busses(&self, key: IoKey) -> Option<&[Bus]> {
        match self.map.get(&key)? {
            Input::Busses(busses) => Some(busses),
            Input::Unit(_) => None,
        }
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.map.values().filter_map(|input| match input {
            Input::Unit(unit) => Some(unit),
            Input::Busses(_) => None,
        })
    }

    /// Widest input; bus arrays count one channel per bus.
    pub fn max_num_channels(&self) -> usize {
        self.map
            .values()
            .map(|input| match input {
                Input::Unit(unit) => unit.num_channels(),
                Input::Busses(busses) => busses.len(),
            })
            .max()
            .unwrap_or(1)
            .max(1)
    }

    /// Largest block size among unit inputs, or no preference.
    pub fn max_block_size(&self) -> BlockSize {
        self.units()
            .map(Unit::max_block_size)
            .fold(None, |best: Option<BlockSize>, size| match best {
                Some(best) if best.get() >= size.get() => Some(best),
                _ => Some(size),
            })
            .unwrap_or_else(BlockSize::no_preference)
    }

    /// Highest sample rate among unit inputs, or no preference.
    pub fn max_sample_rate(&self) -> SampleRate {
        self.units()
            .map(Unit::max_sample_rate)
            .fold(None, |best: Option<SampleRate>, rate| match best {
                Some(best) if best.get() >= rate.get() => Some(best),
                _ => Some(rate),
            })
            .unwrap_or_else(SampleRate::no_preference)
    }
}
