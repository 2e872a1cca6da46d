//! The workload capability consumed by sandboxes
//!
//! A workload is the unit under test. The core only knows it through the
//! [`Workload`] trait; concrete implementations live in `bam-workloads` or in
//! the embedding application.

use crate::sample::Outcome;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Free-form `key -> value` properties handed to every workload
pub type Properties = BTreeMap<String, String>;

/// One simulated client
///
/// Each sandbox owns exactly one instance, created by the run's
/// [`WorkloadFactory`]. Calls never overlap on the same instance.
#[async_trait]
pub trait Workload: Send {
    /// Workload identifier (e.g., "sleep", "jitter")
    fn name(&self) -> &str;

    /// Prepare per-client state. A failure here is fatal to the sandbox.
    async fn init(&mut self, properties: &Properties) -> Result<(), WorkloadError>;

    /// Perform one unit of work.
    ///
    /// `started` is the instant the sandbox started timing this call. An
    /// `Err` is recorded as the outcome given by [`WorkloadError::to_outcome`]
    /// and the sandbox keeps going.
    async fn work(&mut self, started: Instant) -> Result<Outcome, WorkloadError>;

    /// Release per-client state
    async fn close(&mut self) -> Result<(), WorkloadError> {
        Ok(())
    }
}

/// Creates one workload instance per sandbox
pub type WorkloadFactory = Arc<dyn Fn() -> Box<dyn Workload> + Send + Sync>;

/// Workload-specific errors
#[derive(Debug, thiserror::Error)]
pub enum WorkloadError {
    /// A property was missing or malformed
    #[error("Invalid property {key}: {reason}")]
    InvalidProperty {
        /// Property key
        key: String,
        /// Why it was rejected
        reason: String,
    },

    /// The system under test could not be reached or set up
    #[error("Initialization failed: {0}")]
    Init(String),

    /// The operation failed
    #[error("Operation failed: {0}")]
    Operation(String),

    /// The operation produced a result the workload did not expect
    #[error("Unexpected result: {0}")]
    Unexpected(String),

    /// The operation did not finish in time
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Cleanup failed
    #[error("Close failed: {0}")]
    Close(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkloadError {
    /// Convenience constructor for [`WorkloadError::InvalidProperty`]
    pub fn invalid_property(key: impl Into<String>, reason: impl Into<String>) -> Self {
        WorkloadError::InvalidProperty {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Outcome recorded when `work()` returns this error
    pub fn to_outcome(&self) -> Outcome {
        match self {
            WorkloadError::Timeout(_) => Outcome::Timeout,
            WorkloadError::Unexpected(_) => Outcome::Unexpected,
            _ => Outcome::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workload_error_to_outcome() {
        assert_eq!(
            WorkloadError::Timeout(Duration::from_secs(1)).to_outcome(),
            Outcome::Timeout
        );
        assert_eq!(
            WorkloadError::Unexpected("updated 0 documents".into()).to_outcome(),
            Outcome::Unexpected
        );
        assert_eq!(
            WorkloadError::Operation("refused".into()).to_outcome(),
            Outcome::Error
        );
        assert_eq!(
            WorkloadError::invalid_property("sleep.micros", "not a number").to_outcome(),
            Outcome::Error
        );
    }

    #[test]
    fn test_invalid_property_message() {
        let err = WorkloadError::invalid_property("jitter.error_rate", "must be within [0, 1]");
        assert_eq!(
            err.to_string(),
            "Invalid property jitter.error_rate: must be within [0, 1]"
        );
    }
}
