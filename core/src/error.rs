//! Error types for bam-core

use std::fmt;

use thiserror::Error;

/// Broad classification of a [`BenchError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchErrorKind {
    /// Invalid or missing configuration
    Config,
    /// A sandbox could not initialize its workload
    Startup,
    /// Lifecycle coordination failure in the master
    Orchestration,
    /// The run was already shutting down
    Shutdown,
}

impl BenchErrorKind {
    fn as_str(&self) -> &'static str {
        match self {
            BenchErrorKind::Config => "configuration",
            BenchErrorKind::Startup => "startup",
            BenchErrorKind::Orchestration => "orchestration",
            BenchErrorKind::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for BenchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core error type
#[derive(Error, Debug, Clone)]
#[error("{kind} error: {message}")]
pub struct BenchError {
    /// What went wrong, broadly
    pub kind: BenchErrorKind,
    /// Human readable detail
    pub message: String,
}

impl BenchError {
    /// Create an error of the given kind
    pub fn new(kind: BenchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A builder was finalized without a required field
    pub fn missing_config(field: &str) -> Self {
        Self::new(
            BenchErrorKind::Config,
            format!("missing required field: {field}"),
        )
    }

    /// Configuration rejected by validation
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(BenchErrorKind::Config, message)
    }

    /// Workload `init` failed inside a sandbox
    pub fn startup(worker_id: usize, message: impl fmt::Display) -> Self {
        Self::new(
            BenchErrorKind::Startup,
            format!("sandbox {worker_id} failed to start: {message}"),
        )
    }

    /// Master lifecycle failure
    pub fn orchestration(message: impl Into<String>) -> Self {
        Self::new(BenchErrorKind::Orchestration, message)
    }

    /// The run is already shutting down
    pub fn shutdown() -> Self {
        Self::new(BenchErrorKind::Shutdown, "run is shutting down")
    }

    /// Whether this error came from a sandbox startup failure
    pub fn is_startup(&self) -> bool {
        self.kind == BenchErrorKind::Startup
    }
}

/// Result type alias
pub type BenchResult<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_names_field() {
        let err = BenchError::missing_config("factory");
        assert_eq!(err.kind, BenchErrorKind::Config);
        assert!(err.message.contains("factory"));
        assert_eq!(
            err.to_string(),
            "configuration error: missing required field: factory"
        );
    }

    #[test]
    fn test_startup_error() {
        let err = BenchError::startup(3, "connection refused");
        assert!(err.is_startup());
        assert!(err.to_string().contains("sandbox 3"));
        assert!(err.to_string().contains("connection refused"));
    }
}
