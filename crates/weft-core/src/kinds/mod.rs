//! Structural node kinds.
//!
//! These are the kinds the graph machinery itself relies on: arithmetic for
//! mul/add folding, mixing, resampling for `ar`/`kr`, sample-format
//! conversion, bus access and control-thread parameters. Signal generators
//! and effects plug in through [`Processor`](crate::Processor) the same way.

mod binary;
mod bus_io;
mod convert;
mod mixer;
mod mul_add;
mod param;
mod resample;

pub use binary::{Binary, BinaryOp};
pub use bus_io::{BusRead, BusWrite};
pub use convert::{FormatConvert, SampleFormat};
pub use mixer::Mixer;
pub use mul_add::MulAdd;
pub use param::Param;
pub use resample::{Interp, Resample};
