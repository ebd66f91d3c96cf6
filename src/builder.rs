//! Builder for configuring and constructing an [`Engine`].

use crate::{Engine, Result};
use weft_core::EngineConfig;

/// Collects engine settings, validates them and applies the process-wide
/// rate defaults.
///
/// # Example
///
/// ```
/// use weft::prelude::*;
///
/// let engine = Engine::builder()
///     .inputs(1)
///     .outputs(2)
///     .build()?;
///
/// assert_eq!(engine.sample_rate(), 44100.0);
/// # Ok::<(), weft::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    config: EngineConfig,
}

impl EngineBuilder {
    /// Start from an existing configuration.
    pub fn from_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Default: 44100
    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    /// Default: 512
    pub fn graph_block_size(mut self, size: usize) -> Self {
        self.config.graph_block_size = size;
        self
    }

    /// Default: 0
    pub fn inputs(mut self, count: usize) -> Self {
        self.config.inputs = count;
        self
    }

    /// Default: 2
    pub fn outputs(mut self, count: usize) -> Self {
        self.config.outputs = count;
        self
    }

    /// Default: 32768
    pub fn bus_buffer_size(mut self, size: usize) -> Self {
        self.config.bus_buffer_size = size;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validates the configuration and makes its sample rate and block size
    /// the process-wide defaults.
    pub fn build(self) -> Result<Engine> {
        self.config.validate()?;
        Engine::new(self.config)
    }
}
