//! Engine configuration.

use crate::bus::Bus;
use crate::rate::{BlockSize, SampleRate};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration for an engine rendering a weft graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_rate: f64,
    /// Samples per graph block. Host buffers are rendered in chunks of this size.
    pub graph_block_size: usize,
    /// Host channels written into the input busses.
    pub inputs: usize,
    pub outputs: usize,
    /// Initial length of every bus. Busses grow from here on underrun.
    pub bus_buffer_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: SampleRate::DEFAULT,
            graph_block_size: BlockSize::DEFAULT,
            inputs: 0,
            outputs: 2,
            bus_buffer_size: Bus::DEFAULT_BUFFER_SIZE,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if !(8000.0..=384000.0).contains(&self.sample_rate) {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }

        if !(1..=8192).contains(&self.graph_block_size) {
            return Err(Error::InvalidConfig(format!(
                "graph_block_size {} out of range (1-8192)",
                self.graph_block_size
            )));
        }

        if self.outputs == 0 {
            return Err(Error::InvalidConfig("outputs must be at least 1".into()));
        }

        if !self.bus_buffer_size.is_power_of_two() || self.bus_buffer_size < self.graph_block_size
        {
            return Err(Error::InvalidConfig(format!(
                "bus_buffer_size {} must be a power of two no smaller than the graph block",
                self.bus_buffer_size
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.sample_rate, 44100.0);
        assert_eq!(config.graph_block_size, 512);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range() {
        let bad = [
            EngineConfig {
                sample_rate: 4000.0,
                ..Default::default()
            },
            EngineConfig {
                graph_block_size: 0,
                ..Default::default()
            },
            EngineConfig {
                outputs: 0,
                ..Default::default()
            },
            EngineConfig {
                bus_buffer_size: 1000,
                ..Default::default()
            },
        ];

        for config in bad {
            assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        }
    }
}
