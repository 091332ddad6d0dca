//! Builder for configuring optimizer instances

use std::sync::Arc;

use super::AssetOptimizer;
use crate::Result;
use crate::clock::{Clock, SystemClock};
use crate::config::OptimizerConfig;
use crate::providers::{HttpOptimizer, Optimizer};
use crate::storage::{DataStore, FileDataStore};

/// Builder for [`AssetOptimizer`].
///
/// Every collaborator has a production default derived from the
/// configuration, so the minimal setup is a config with a secret:
///
/// ```rust,no_run
/// # use asset_optimizer::{AssetOptimizer, OptimizerConfig};
/// # fn main() -> asset_optimizer::Result<()> {
/// let optimizer = AssetOptimizer::builder()
///     .config(OptimizerConfig::new().secret("s3cr3t"))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct AssetOptimizerBuilder {
    config: OptimizerConfig,
    optimizer: Option<Arc<dyn Optimizer>>,
    store: Option<Arc<dyn DataStore>>,
    clock: Option<Arc<dyn Clock>>,
}

impl AssetOptimizerBuilder {
    pub fn new() -> Self {
        Self {
            config: OptimizerConfig::default(),
            optimizer: None,
            store: None,
            clock: None,
        }
    }

    /// Use this configuration (default: [`OptimizerConfig::default`]).
    pub fn config(mut self, config: OptimizerConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom optimization provider instead of [`HttpOptimizer`].
    pub fn optimizer(mut self, optimizer: Arc<dyn Optimizer>) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    /// Use a custom data store for usage counters and audit logs instead
    /// of a [`FileDataStore`] rooted at `config.data_dir`.
    pub fn data_store(mut self, store: Arc<dyn DataStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a custom clock instead of [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate the configuration and assemble the engine.
    ///
    /// Fails when the configuration is invalid or when no optimizer was
    /// injected and no secret is configured.
    pub fn build(self) -> Result<AssetOptimizer> {
        self.config.validate()?;

        let optimizer = match self.optimizer {
            Some(optimizer) => optimizer,
            None => Arc::new(HttpOptimizer::from_config(&self.config)?),
        };
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(FileDataStore::new(self.config.data_dir.clone())));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        Ok(AssetOptimizer::new(self.config, optimizer, store, clock))
    }
}

impl Default for AssetOptimizerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
