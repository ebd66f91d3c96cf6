//! Pull-based audio graph substrate.
//!
//! A graph is built from [`Unit`]s, ordered groups of shared [`Node`]s. The
//! host pulls the output unit once per block with a [`RenderContext`] whose
//! [`Clock`] marks the block start; every node renders at most once per
//! clock whatever its fan-in, at its own block size and sample rate.
//! [`Bus`]ses carry signal between graphs by time rather than by reference.
//!
//! # Example
//!
//! ```
//! use weft_core::prelude::*;
//!
//! let gain = Unit::constant(0.5);
//! let mut out = (Unit::constant(1.0) * gain).mix();
//!
//! let ctx = RenderContext::new(Clock::ZERO);
//! let mut left = [0.0; 64];
//! out.process_into(&ctx, &mut [&mut left[..]]);
//! assert!(left.iter().all(|&s| s == 0.5));
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod clock;
pub use clock::Clock;

mod context;
pub use context::RenderContext;

pub mod lockfree;
pub use lockfree::{
    Atom, AtomicDouble, AtomicFloat, AtomicTagged, AtomicValue, FreeList, Tagged,
};

pub mod rate;
pub use rate::{BlockSize, Overlap, RateValue, SampleRate};

mod buffer;
pub use buffer::{scaled_sample, Buffer, Sample};

pub mod node;
pub use node::{Input, Inputs, Io, IoKey, Lifecycle, Node, Processor};

mod unit;
pub use unit::Unit;

pub mod kinds;
pub use kinds::{
    Binary, BinaryOp, BusRead, BusWrite, FormatConvert, Interp, Mixer, MulAdd, Param, Resample,
    SampleFormat,
};

pub mod bus;
pub use bus::{Bus, BusKey, BusRegistry};

mod config;
pub use config::EngineConfig;

pub mod smooth;
pub use smooth::SmoothedValue;

pub mod prelude {
    //! The types needed to build and render a graph.
    pub use crate::{
        BlockSize, Bus, BusRegistry, Clock, EngineConfig, Interp, IoKey, Node, Processor,
        RenderContext, Sample, SampleFormat, SampleRate, Unit,
    };
}
