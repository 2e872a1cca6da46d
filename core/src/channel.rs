//! Sample channel configuration (sandboxes -> collector -> calculator)

use crate::config::ConfigError;
use crate::traits::Properties;
use serde::{Deserialize, Serialize};

/// Property that sizes the sample channel
pub const SAMPLE_BUFFER_PROPERTY: &str = "internals.LatencyEventChannelSize";

/// Channel buffer configuration for the sample stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Sample channel buffer size; 0 means unbuffered
    pub sample_buffer: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self { sample_buffer: 0 }
    }
}

impl ChannelConfig {
    /// Create a new channel config with custom sample buffer size
    pub fn with_sample_buffer(mut self, size: usize) -> Self {
        self.sample_buffer = size;
        self
    }

    /// Read the buffer size from `internals.LatencyEventChannelSize`
    pub fn from_properties(properties: &Properties) -> Result<Self, ConfigError> {
        let Some(raw) = properties.get(SAMPLE_BUFFER_PROPERTY) else {
            return Ok(Self::default());
        };

        let size = raw.trim().parse::<usize>().map_err(|_| {
            ConfigError::InvalidProperty {
                key: SAMPLE_BUFFER_PROPERTY.to_string(),
                reason: format!("must be an integer >= 0, got {raw:?}"),
            }
        })?;

        Ok(Self::default().with_sample_buffer(size))
    }

    /// Capacity handed to the bounded queue
    ///
    /// A bounded queue cannot have zero slots, so "unbuffered" becomes a
    /// single slot: every publisher still waits for the consumer as soon as
    /// one sample is pending.
    pub fn capacity(&self) -> usize {
        self.sample_buffer.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_config_default_is_unbuffered() {
        let config = ChannelConfig::default();
        assert_eq!(config.sample_buffer, 0);
        assert_eq!(config.capacity(), 1);
    }

    #[test]
    fn test_channel_config_builder() {
        let config = ChannelConfig::default().with_sample_buffer(5000);
        assert_eq!(config.sample_buffer, 5000);
        assert_eq!(config.capacity(), 5000);
    }

    #[test]
    fn test_channel_config_from_properties() {
        let mut props = Properties::new();
        assert_eq!(
            ChannelConfig::from_properties(&props).unwrap(),
            ChannelConfig::default()
        );

        props.insert(SAMPLE_BUFFER_PROPERTY.into(), "256".into());
        assert_eq!(
            ChannelConfig::from_properties(&props).unwrap().sample_buffer,
            256
        );
    }

    #[test]
    fn test_channel_config_rejects_negative_size() {
        let mut props = Properties::new();
        props.insert(SAMPLE_BUFFER_PROPERTY.into(), "-1".into());
        let err = ChannelConfig::from_properties(&props).unwrap_err();
        assert!(err.to_string().contains(SAMPLE_BUFFER_PROPERTY));
    }
}
