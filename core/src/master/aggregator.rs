//! Pool-wide totals from the per-sandbox bookkeeping

use serde::Serialize;
use std::time::Duration;

use crate::sandbox::SandboxStats;

/// Aggregated statistics from all sandboxes that ran
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PoolStats {
    /// Number of sandboxes that ran to completion
    pub sandboxes: usize,

    /// Total OK operations
    pub ok: usize,

    /// Total operations with any other outcome
    pub errors: usize,

    /// Total stall-mode pauses
    pub stalls: usize,

    /// Longest loop runtime across all sandboxes
    pub longest_runtime: Duration,
}

impl PoolStats {
    /// Get the total number of operations (ok + errors)
    pub fn total_ops(&self) -> usize {
        self.ok + self.errors
    }

    /// Get the success rate (0.0 - 1.0)
    pub fn success_rate(&self) -> f64 {
        let total = self.total_ops();
        if total > 0 {
            self.ok as f64 / total as f64
        } else {
            0.0
        }
    }

    /// Get the error rate (0.0 - 1.0)
    pub fn error_rate(&self) -> f64 {
        if self.total_ops() == 0 {
            0.0
        } else {
            1.0 - self.success_rate()
        }
    }
}

/// Aggregate statistics from multiple sandboxes
pub fn aggregate_sandbox_stats(stats: &[SandboxStats]) -> PoolStats {
    let mut total = SandboxStats::default();
    for s in stats {
        total.merge(s);
    }

    let longest_runtime = stats
        .iter()
        .filter_map(|s| s.elapsed())
        .max()
        .unwrap_or(Duration::ZERO);

    PoolStats {
        sandboxes: stats.len(),
        ok: total.completed,
        errors: total.errors,
        stalls: total.stalls,
        longest_runtime,
    }
}
