//! Builder pattern for Master construction

use std::time::Duration;

use tokio::sync::mpsc;

use crate::calculator::SummaryEvent;
use crate::channel::ChannelConfig;
use crate::config::RunConfig;
use crate::error::{BenchError, BenchResult};
use crate::sandbox::StallPolicy;
use crate::traits::WorkloadFactory;

use super::executor::Master;

/// Builder for creating a Master with proper configuration
///
/// # Example
///
/// ```ignore
/// let (master, summaries) = MasterBuilder::new()
///     .workers(4)
///     .duration(Duration::from_secs(10))
///     .factory(registry.factory("sleep")?)
///     .build()?;
/// ```
pub struct MasterBuilder {
    config: RunConfig,
    factory: Option<WorkloadFactory>,
}

impl MasterBuilder {
    /// Create a new master builder with default configuration
    pub fn new() -> Self {
        Self {
            config: RunConfig::default(),
            factory: None,
        }
    }

    /// Set the full run configuration
    pub fn config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the number of sandboxes
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Set the run duration
    pub fn duration(mut self, duration: Duration) -> Self {
        self.config.duration = duration;
        self
    }

    /// Enable or disable per-client histograms
    pub fn per_client_stats(mut self, enabled: bool) -> Self {
        self.config.per_client_stats = enabled;
        self
    }

    /// Add a workload property
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.properties.insert(key.into(), value.into());
        self
    }

    /// Set the summary interval
    pub fn summary_interval(mut self, interval: Duration) -> Self {
        self.config.summary_interval = interval;
        self
    }

    /// Set the drain batch size
    pub fn drain_batch(mut self, batch: usize) -> Self {
        self.config.drain_batch = batch;
        self
    }

    /// Set the channel configuration
    pub fn channel_config(mut self, config: ChannelConfig) -> Self {
        self.config.channel = config;
        self
    }

    /// Set the stall policy
    pub fn stall(mut self, stall: StallPolicy) -> Self {
        self.config.stall = stall;
        self
    }

    /// Set the workload factory
    pub fn factory(mut self, factory: WorkloadFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Build the master and return it along with the summary receiver
    ///
    /// The receiver yields one event per tick plus a final one, then ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the factory is not set or if configuration
    /// validation fails.
    pub fn build(self) -> BenchResult<(Master, mpsc::UnboundedReceiver<SummaryEvent>)> {
        let factory = self
            .factory
            .ok_or_else(|| BenchError::missing_config("factory"))?;

        self.config
            .validate()
            .map_err(|e| BenchError::config(e.to_string()))?;

        let (summary_tx, summary_rx) = mpsc::unbounded_channel();

        let master = Master::new(self.config, factory, summary_tx);

        Ok((master, summary_rx))
    }
}

impl Default for MasterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
