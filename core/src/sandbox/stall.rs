//! Stall mode: an optional pause after every N operations

use crate::config::ConfigError;
use crate::traits::Properties;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Property that enables stall mode
pub const OPS_PER_STALL_PROPERTY: &str = "internals.OpsPerStall";

/// Smallest accepted `internals.OpsPerStall`
pub const MIN_OPS_PER_STALL: u64 = 10_000;

/// Pause inserted by stall mode
pub const DEFAULT_STALL_PAUSE: Duration = Duration::from_secs(1);

/// Throttling for workloads fast enough to starve the rest of the runtime
///
/// Disabled by default. When enabled, a sandbox sleeps for `pause` once it
/// has completed more than `ops_per_stall` operations since the last pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StallPolicy {
    /// Operations between pauses; `None` disables stalling
    pub ops_per_stall: Option<u64>,
    /// Length of each pause
    pub pause: Duration,
}

impl Default for StallPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

impl StallPolicy {
    /// No stalling
    pub fn disabled() -> Self {
        Self {
            ops_per_stall: None,
            pause: DEFAULT_STALL_PAUSE,
        }
    }

    /// Pause for one second after every `ops` operations
    pub fn every(ops: u64) -> Self {
        Self {
            ops_per_stall: Some(ops),
            pause: DEFAULT_STALL_PAUSE,
        }
    }

    /// Override the pause length
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Read `internals.OpsPerStall`, enforcing [`MIN_OPS_PER_STALL`]
    pub fn from_properties(properties: &Properties) -> Result<Self, ConfigError> {
        let Some(raw) = properties.get(OPS_PER_STALL_PROPERTY) else {
            return Ok(Self::disabled());
        };

        match raw.trim().parse::<u64>() {
            Ok(ops) if ops >= MIN_OPS_PER_STALL => Ok(Self::every(ops)),
            _ => Err(ConfigError::InvalidProperty {
                key: OPS_PER_STALL_PROPERTY.to_string(),
                reason: format!(
                    "must be >= {MIN_OPS_PER_STALL} ops, got {raw:?}; \
                     leave it unset when response times are slow enough to measure"
                ),
            }),
        }
    }

    /// Check if stall mode is on
    pub fn is_enabled(&self) -> bool {
        self.ops_per_stall.is_some()
    }
}

/// Per-sandbox stall bookkeeping
#[derive(Debug)]
pub(crate) struct Staller {
    policy: StallPolicy,
    counter: u64,
}

impl Staller {
    pub(crate) fn new(policy: StallPolicy) -> Self {
        Self { policy, counter: 0 }
    }

    /// Count one operation and pause if the threshold was crossed.
    /// Returns `true` when a pause happened.
    pub(crate) async fn after_op(&mut self) -> bool {
        let Some(limit) = self.policy.ops_per_stall else {
            return false;
        };

        self.counter += 1;
        if self.counter <= limit {
            return false;
        }

        self.counter = 0;
        tokio::time::sleep(self.policy.pause).await;
        true
    }
}
