//! Run configuration types

use crate::channel::ChannelConfig;
use crate::sandbox::StallPolicy;
use crate::traits::Properties;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default interval between summary events
pub const DEFAULT_SUMMARY_INTERVAL: Duration = Duration::from_secs(2);

/// Default number of samples drained per master loop iteration
pub const DEFAULT_DRAIN_BATCH: usize = 64;

/// Run configuration
///
/// Defines how many sandboxes run, for how long, and how the sample
/// pipeline is tuned. Owned by the master once validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of concurrent sandboxes (the planned load)
    pub workers: usize,

    /// How long every sandbox keeps working
    pub duration: Duration,

    /// Keep a histogram per sandbox in addition to the global one
    pub per_client_stats: bool,

    /// Properties passed to every workload's `init`
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,

    /// Interval between summary events
    pub summary_interval: Duration,

    /// Upper bound on samples drained between tick checks
    pub drain_batch: usize,

    /// Sample channel sizing
    pub channel: ChannelConfig,

    /// Optional sandbox throttling
    pub stall: StallPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            duration: Duration::from_secs(10),
            per_client_stats: false,
            properties: Properties::new(),
            summary_interval: DEFAULT_SUMMARY_INTERVAL,
            drain_batch: DEFAULT_DRAIN_BATCH,
            channel: ChannelConfig::default(),
            stall: StallPolicy::disabled(),
        }
    }
}

impl RunConfig {
    /// Create a new config with the given number of workers
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            ..Default::default()
        }
    }

    /// Set the run duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Enable or disable per-client histograms
    pub fn with_per_client_stats(mut self, enabled: bool) -> Self {
        self.per_client_stats = enabled;
        self
    }

    /// Add a workload property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Replace all workload properties
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Set the summary interval
    pub fn with_summary_interval(mut self, interval: Duration) -> Self {
        self.summary_interval = interval;
        self
    }

    /// Set the drain batch size
    pub fn with_drain_batch(mut self, batch: usize) -> Self {
        self.drain_batch = batch;
        self
    }

    /// Set the channel configuration
    pub fn with_channel(mut self, channel: ChannelConfig) -> Self {
        self.channel = channel;
        self
    }

    /// Set the stall policy
    pub fn with_stall(mut self, stall: StallPolicy) -> Self {
        self.stall = stall;
        self
    }

    /// Apply the `internals.*` tuning properties found in `properties`
    pub fn with_internal_properties(mut self) -> Result<Self, ConfigError> {
        self.channel = ChannelConfig::from_properties(&self.properties)?;
        self.stall = StallPolicy::from_properties(&self.properties)?;
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers(
                "worker count must be at least 1".into(),
            ));
        }

        if self.duration.is_zero() {
            return Err(ConfigError::InvalidDuration(
                "duration must be positive".into(),
            ));
        }

        if self.summary_interval.is_zero() {
            return Err(ConfigError::InvalidSummaryInterval(
                "summary interval must be positive".into(),
            ));
        }

        if self.drain_batch == 0 {
            return Err(ConfigError::InvalidDrainBatch(
                "drain batch must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count: {0}")]
    InvalidWorkers(String),

    /// Invalid duration
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    /// Invalid summary interval
    #[error("Invalid summary interval: {0}")]
    InvalidSummaryInterval(String),

    /// Invalid drain batch
    #[error("Invalid drain batch: {0}")]
    InvalidDrainBatch(String),

    /// Invalid internal tuning property
    #[error("Invalid property {key}: {reason}")]
    InvalidProperty {
        /// Property key
        key: String,
        /// Why it was rejected
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::SAMPLE_BUFFER_PROPERTY;
    use crate::sandbox::OPS_PER_STALL_PROPERTY;

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert_eq!(config.workers, 1);
        assert_eq!(config.duration, Duration::from_secs(10));
        assert!(!config.per_client_stats);
        assert_eq!(config.summary_interval, DEFAULT_SUMMARY_INTERVAL);
        assert_eq!(config.drain_batch, DEFAULT_DRAIN_BATCH);
        assert!(!config.stall.is_enabled());
    }

    #[test]
    fn test_config_builder_pattern() {
        let config = RunConfig::new(8)
            .with_duration(Duration::from_secs(30))
            .with_per_client_stats(true)
            .with_property("sleep.micros", "250");

        assert_eq!(config.workers, 8);
        assert_eq!(config.duration, Duration::from_secs(30));
        assert!(config.per_client_stats);
        assert_eq!(config.properties.get("sleep.micros").unwrap(), "250");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_workers() {
        let config = RunConfig::new(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWorkers(_))
        ));
    }

    #[test]
    fn test_config_validation_zero_duration() {
        let config = RunConfig::new(1).with_duration(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_config_validation_zero_batch_and_interval() {
        assert!(RunConfig::new(1).with_drain_batch(0).validate().is_err());
        assert!(RunConfig::new(1)
            .with_summary_interval(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn test_internal_properties_applied() {
        let config = RunConfig::new(2)
            .with_property(SAMPLE_BUFFER_PROPERTY, "128")
            .with_property(OPS_PER_STALL_PROPERTY, "20000")
            .with_internal_properties()
            .unwrap();

        assert_eq!(config.channel.sample_buffer, 128);
        assert_eq!(config.stall.ops_per_stall, Some(20_000));
    }

    #[test]
    fn test_internal_properties_rejected() {
        let result = RunConfig::new(2)
            .with_property(OPS_PER_STALL_PROPERTY, "10")
            .with_internal_properties();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidProperty { .. })
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = RunConfig::new(5).with_property("k", "v");

        let json = serde_json::to_string(&config).unwrap();
        let deserialized: RunConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.workers, 5);
        assert_eq!(deserialized.properties.get("k").unwrap(), "v");
    }
}
