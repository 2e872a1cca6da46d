//! Sandbox statistics tracking

use crate::sample::Outcome;
use std::time::{Duration, Instant};

/// Statistics tracked by each sandbox
///
/// These are bookkeeping for the pool summary only; latency statistics are
/// computed by the calculator from the published samples.
#[derive(Debug, Default, Clone)]
pub struct SandboxStats {
    /// Sandbox identifier
    pub worker_id: usize,

    /// Operations that returned [`Outcome::Ok`]
    pub completed: usize,

    /// Operations with any other outcome
    pub errors: usize,

    /// Number of stall-mode pauses taken
    pub stalls: usize,

    /// Loop start time
    pub started_at: Option<Instant>,

    /// Loop end time
    pub ended_at: Option<Instant>,
}

impl SandboxStats {
    /// Create new empty stats
    pub fn new(worker_id: usize) -> Self {
        Self {
            worker_id,
            ..Default::default()
        }
    }

    /// Start tracking (records start time)
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    /// Stop tracking (records end time)
    pub fn stop(&mut self) {
        self.ended_at = Some(Instant::now());
    }

    /// Get total number of operations (completed + errors)
    pub fn total_ops(&self) -> usize {
        self.completed + self.errors
    }

    /// Get success rate (0.0 - 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.total_ops() == 0 {
            0.0
        } else {
            self.completed as f64 / self.total_ops() as f64
        }
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|start| {
            self.ended_at
                .map(|end| end.duration_since(start))
                .unwrap_or_else(|| start.elapsed())
        })
    }

    /// Record one operation
    pub fn record(&mut self, outcome: Outcome) {
        if outcome.is_ok() {
            self.completed += 1;
        } else {
            self.errors += 1;
        }
    }

    /// Record a stall-mode pause
    pub fn record_stall(&mut self) {
        self.stalls += 1;
    }

    /// Merge stats from another sandbox
    pub fn merge(&mut self, other: &SandboxStats) {
        self.completed += other.completed;
        self.errors += other.errors;
        self.stalls += other.stalls;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sandbox_stats_defaults() {
        let stats = SandboxStats::new(4);
        assert_eq!(stats.worker_id, 4);
        assert_eq!(stats.total_ops(), 0);
        assert_eq!(stats.success_rate(), 0.0);
        assert!(stats.elapsed().is_none());
    }

    #[test]
    fn test_sandbox_stats_record() {
        let mut stats = SandboxStats::new(0);
        stats.record(Outcome::Ok);
        stats.record(Outcome::Ok);
        stats.record(Outcome::Timeout);
        stats.record(Outcome::Error);

        assert_eq!(stats.completed, 2);
        assert_eq!(stats.errors, 2);
        assert!((stats.success_rate() - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_sandbox_stats_merge() {
        let mut a = SandboxStats::new(0);
        a.completed = 10;
        a.errors = 1;
        a.stalls = 2;

        let mut b = SandboxStats::new(1);
        b.completed = 5;
        b.errors = 2;

        a.merge(&b);
        assert_eq!(a.completed, 15);
        assert_eq!(a.errors, 3);
        assert_eq!(a.stalls, 2);
    }

    #[test]
    fn test_sandbox_stats_start_stop() {
        let mut stats = SandboxStats::new(0);
        stats.start();
        std::thread::sleep(Duration::from_millis(10));
        stats.stop();

        assert!(stats.elapsed().unwrap() >= Duration::from_millis(10));
    }
}
