//! Engine configuration.

use thiserror::Error;

use crate::scheduler::Topology;
use crate::storage::Chunk;

/// Errors from [`EngineConfig::validate()`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Worker count must be greater than zero.
    #[error("workers must be greater than zero")]
    ZeroWorkers,
    /// Target chunk size must be greater than zero.
    #[error("target_chunk_size must be greater than zero")]
    ZeroChunkSize,
    /// A topology needs at least one node.
    #[error("topology must have at least one node")]
    ZeroNodes,
}

/// Configuration for an [`EngineContext`](crate::context::EngineContext).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Worker threads for the task scheduler.
    pub workers: usize,
    /// Scheduler topology; `None` auto-detects from the worker count.
    pub topology: Option<Topology>,
    /// Default target chunk size for new data tables.
    pub target_chunk_size: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism().map_or(4, usize::from),
            topology: None,
            target_chunk_size: Chunk::DEFAULT_SIZE,
        }
    }
}

impl EngineConfig {
    /// Checks the configuration for internal consistency.
    ///
    /// # Errors
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.target_chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if let Some(topology) = &self.topology {
            if topology.num_nodes == 0 {
                return Err(ConfigError::ZeroNodes);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_rules() {
        let mut config = EngineConfig::default();
        config.workers = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroWorkers));

        let mut config = EngineConfig::default();
        config.target_chunk_size = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroChunkSize));

        let mut config = EngineConfig::default();
        config.topology = Some(Topology::with_nodes(0, 1));
        assert_eq!(config.validate(), Err(ConfigError::ZeroNodes));
    }
}
