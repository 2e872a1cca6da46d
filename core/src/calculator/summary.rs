//! Periodic progress event

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One fold of the running statistics
///
/// Emitted on every summary tick and once more at shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryEvent {
    /// Time since the run started
    pub elapsed: Duration,
    /// Weighted running mean of OK latencies, in microseconds
    pub mean_response_micros: f64,
    /// OK operations per second over the whole run so far
    pub ops_per_sec: f64,
    /// Little's-law estimate of the busy fraction of the planned load
    pub efficiency: f64,
    /// OK operations folded so far
    pub ops: u64,
}

impl SummaryEvent {
    /// Elapsed time in fractional seconds
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}
