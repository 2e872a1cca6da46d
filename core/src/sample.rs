//! Operation outcomes and latency samples

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of one workload operation
///
/// Only [`Outcome::Ok`] operations contribute to latency statistics; the
/// others are counted per outcome and otherwise excluded.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Operation completed and was measured
    Ok,
    /// Operation completed but produced a result the workload did not expect
    Unexpected,
    /// Operation timed out
    Timeout,
    /// Operation failed
    Error,
}

impl Outcome {
    /// Every outcome, in report order
    pub const ALL: [Outcome; 4] = [
        Outcome::Ok,
        Outcome::Unexpected,
        Outcome::Timeout,
        Outcome::Error,
    ];

    /// Check if this outcome counts towards latency statistics
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok)
    }

    /// Check if this outcome is counted as an error
    pub fn is_error(&self) -> bool {
        !self.is_ok()
    }

    /// Short lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Unexpected => "unexpected",
            Outcome::Timeout => "timeout",
            Outcome::Error => "error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completed operation, as reported by a sandbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Sandbox that performed the operation
    pub worker_id: usize,
    /// Wall time spent in `work()`, in microseconds
    pub latency_micros: u64,
    /// How the operation ended
    pub outcome: Outcome,
}

impl Sample {
    /// Create a new sample
    pub fn new(worker_id: usize, latency_micros: u64, outcome: Outcome) -> Self {
        Self {
            worker_id,
            latency_micros,
            outcome,
        }
    }

    /// Shorthand for a successful sample
    pub fn ok(worker_id: usize, latency_micros: u64) -> Self {
        Self::new(worker_id, latency_micros, Outcome::Ok)
    }
}
