//! Read-only view of a finished run, consumed by reports

use crate::calculator::HistogramResult;
use crate::master::PoolStats;
use crate::sample::Outcome;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Final statistics of a run
pub trait Statistics {
    /// Wall-clock time the run started
    fn started_at(&self) -> DateTime<Utc>;

    /// Run time covered by the statistics
    fn elapsed(&self) -> Duration;

    /// OK operations per second
    fn throughput(&self) -> f64;

    /// Mean OK latency in microseconds, clamped to a small positive value
    fn mean_response_micros(&self) -> f64;

    /// Little's-law busy fraction of the planned load
    fn efficiency(&self) -> f64;

    /// Configured worker count
    fn planned_load(&self) -> usize;

    /// Histogram snapshot
    fn histogram(&self) -> &HistogramResult;

    /// Failed operations by outcome
    fn errors(&self) -> &BTreeMap<Outcome, u64> {
        &self.histogram().errors
    }

    /// Whether per-client histograms were kept
    fn client_tracking(&self) -> bool;

    /// Histogram of one sandbox, if per-client tracking was on
    fn client_histogram(&self, worker_id: usize) -> Option<&BTreeMap<u64, u64>>;

    /// Mean OK latency of one sandbox, if per-client tracking was on
    fn client_mean_micros(&self, worker_id: usize) -> Option<f64>;
}

/// Per-sandbox latency figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientStatistics {
    /// Sandbox identifier
    pub worker_id: usize,
    /// OK operations of this sandbox
    pub ops: u64,
    /// Mean OK latency of this sandbox, in microseconds
    pub mean_response_micros: f64,
    /// Latency → count for this sandbox
    pub histogram: BTreeMap<u64, u64>,
}

/// Statistics frozen when the master reaches `Dead`
#[derive(Debug, Clone, Serialize)]
pub struct RunStatistics {
    /// Wall-clock start of the run
    pub started_at: DateTime<Utc>,
    /// Elapsed time at the final fold
    pub elapsed: Duration,
    /// Configured worker count
    pub planned_load: usize,
    /// OK operations
    pub ops: u64,
    /// Mean OK latency (µs)
    pub mean_response_micros: f64,
    /// OK operations per second
    pub ops_per_sec: f64,
    /// Busy fraction of the planned load
    pub efficiency: f64,
    /// Final histogram snapshot
    pub histogram: HistogramResult,
    /// Per-sandbox figures when per-client tracking was on
    pub clients: Option<Vec<ClientStatistics>>,
    /// Bookkeeping reported by the sandboxes themselves
    pub pool: PoolStats,
    /// Sandboxes whose workload failed to initialize
    pub startup_failures: usize,
}

impl RunStatistics {
    fn client(&self, worker_id: usize) -> Option<&ClientStatistics> {
        self.clients.as_ref()?.get(worker_id)
    }
}

impl Statistics for RunStatistics {
    fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    fn elapsed(&self) -> Duration {
        self.elapsed
    }

    fn throughput(&self) -> f64 {
        self.ops_per_sec
    }

    fn mean_response_micros(&self) -> f64 {
        self.mean_response_micros
    }

    fn efficiency(&self) -> f64 {
        self.efficiency
    }

    fn planned_load(&self) -> usize {
        self.planned_load
    }

    fn histogram(&self) -> &HistogramResult {
        &self.histogram
    }

    fn client_tracking(&self) -> bool {
        self.clients.is_some()
    }

    fn client_histogram(&self, worker_id: usize) -> Option<&BTreeMap<u64, u64>> {
        self.client(worker_id).map(|c| &c.histogram)
    }

    fn client_mean_micros(&self, worker_id: usize) -> Option<f64> {
        self.client(worker_id).map(|c| c.mean_response_micros)
    }
}
