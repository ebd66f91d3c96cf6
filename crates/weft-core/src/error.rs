//! Error types for weft-core.
//!
//! Only configuration and registry edges return errors. The render path never
//! fails: rate mismatches and underruns are handled by fallback behaviour.

use thiserror::Error;

/// Error type for weft-core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid block size: {0}. Must be at least 1")]
    InvalidBlockSize(usize),

    #[error("Invalid sample rate: {0}. Must be positive and finite")]
    InvalidSampleRate(f64),

    #[error("Invalid overlap: {0}. Must be in (0, 1]")]
    InvalidOverlap(f64),

    #[error("Bus already registered: {0}")]
    BusExists(String),

    #[error("Channel count mismatch: expected {expected}, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },

    #[error("Frame count mismatch: expected {expected}, got {actual}")]
    FrameMismatch { expected: usize, actual: usize },
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
