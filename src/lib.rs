//! # Weft - pull-based audio graph engine
//!
//! Umbrella crate over **weft-core**, the graph substrate: logical clock,
//! memoized nodes, units, busses and lock-free cells. This crate adds the
//! [`Engine`] a host audio callback drives and the [`EngineBuilder`] that
//! configures it.
//!
//! ## Quick Start
//!
//! ```
//! use weft::prelude::*;
//!
//! let mut engine = Engine::builder().outputs(2).build()?;
//!
//! let left = Unit::constant(0.25);
//! let right = Unit::constant(-0.25);
//! engine.set_output(left.concat(&right));
//!
//! let mut l = vec![0.0; 256];
//! let mut r = vec![0.0; 256];
//! engine.render(&[], &mut [&mut l[..], &mut r[..]])?;
//! assert_eq!((l[0], r[255]), (0.25, -0.25));
//! # Ok::<(), weft::Error>(())
//! ```

/// Re-export of weft-core for direct access
pub use weft_core as core;

pub use weft_core::{
    AtomicDouble, AtomicFloat, BlockSize, Bus, BusKey, BusRegistry, Clock, EngineConfig, Interp,
    IoKey, Node, Overlap, Processor, RenderContext, Sample, SampleFormat, SampleRate,
    SmoothedValue, Unit,
};

mod error;
pub use error::{Error, Result};

mod builder;
mod engine;

pub use builder::EngineBuilder;
pub use engine::Engine;

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{Engine, EngineBuilder};

    pub use crate::core::prelude::*;
    pub use crate::core::{AtomicFloat, Io, Inputs, SmoothedValue};
}
