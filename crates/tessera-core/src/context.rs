//! The explicitly constructed engine context.
//!
//! There is no process-wide singleton: everything operators need — the
//! task scheduler and the table registry — lives in an [`EngineContext`]
//! that callers build and pass around. Dropping the context tears down
//! in a fixed order: the scheduler joins its workers first, then the
//! registry releases its tables.

use std::sync::Arc;

use crate::config::{ConfigError, EngineConfig};
use crate::scheduler::{TaskScheduler, Topology};
use crate::storage::TableRegistry;

/// Shared engine services, passed explicitly to operators.
pub struct EngineContext {
    // Field order is teardown order: join workers before tables go away.
    scheduler: Arc<TaskScheduler>,
    tables: TableRegistry,
    config: EngineConfig,
}

impl EngineContext {
    /// Builds a context from a validated configuration.
    ///
    /// # Errors
    /// Returns the configuration's first violated rule.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let topology = config
            .topology
            .clone()
            .unwrap_or_else(|| Topology::auto_detect(config.workers));
        let scheduler = Arc::new(TaskScheduler::with_topology(config.workers, topology));

        Ok(Self {
            scheduler,
            tables: TableRegistry::new(),
            config,
        })
    }

    /// Builds a context with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default()).expect("default config is valid")
    }

    /// The task scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &TaskScheduler {
        &self.scheduler
    }

    /// The table registry.
    #[must_use]
    pub fn tables(&self) -> &TableRegistry {
        &self.tables
    }

    /// The configuration this context was built from.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_construction() {
        let config = EngineConfig {
            workers: 2,
            ..EngineConfig::default()
        };
        let context = EngineContext::new(config).unwrap();
        assert_eq!(context.config().workers, 2);
        assert!(context.tables().table_names().is_empty());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EngineConfig {
            workers: 0,
            ..EngineConfig::default()
        };
        assert!(EngineContext::new(config).is_err());
    }
}
