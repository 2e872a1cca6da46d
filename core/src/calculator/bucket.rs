//! Latency accumulator for one scope (the whole pool or a single sandbox)

use std::collections::BTreeMap;

/// Result of folding the current interval into the running aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fold {
    /// The interval was merged into the running mean
    Merged,
    /// Nothing was recorded since the last fold
    Empty,
    /// The merged mean was not a finite number; the interval was dropped
    Discarded,
}

/// Histogram plus running-average state
///
/// `current_*` counts everything recorded since the last fold and
/// `previous_*` is the aggregate of all folded intervals.
#[derive(Debug, Clone, Default)]
pub(crate) struct Bucket {
    histogram: BTreeMap<u64, u64>,
    current_lag_sum: u64,
    current_ops: u64,
    previous_ops: u64,
    previous_mean: f64,
}

impl Bucket {
    pub(crate) fn record(&mut self, latency_micros: u64) {
        *self.histogram.entry(latency_micros).or_insert(0) += 1;
        self.current_lag_sum = self.current_lag_sum.saturating_add(latency_micros);
        self.current_ops += 1;
    }

    /// Merge the current interval into the weighted running mean
    ///
    /// The current counters are reset whatever the result.
    pub(crate) fn fold(&mut self) -> Fold {
        let current_ops = std::mem::take(&mut self.current_ops);
        let lag_sum = std::mem::take(&mut self.current_lag_sum);

        if current_ops == 0 {
            return Fold::Empty;
        }

        let next_ops = self.previous_ops + current_ops;
        let w0 = self.previous_ops as f64 / next_ops as f64;
        let w1 = current_ops as f64 / next_ops as f64;
        let chunk_mean = lag_sum as f64 / current_ops as f64;
        let next_mean = w0 * self.previous_mean + w1 * chunk_mean;

        if !next_mean.is_finite() {
            return Fold::Discarded;
        }

        self.previous_ops = next_ops;
        self.previous_mean = next_mean;
        Fold::Merged
    }

    /// Operations merged by completed folds
    pub(crate) fn folded_ops(&self) -> u64 {
        self.previous_ops
    }

    /// Operations recorded since the last fold
    pub(crate) fn pending_ops(&self) -> u64 {
        self.current_ops
    }

    /// Running mean in microseconds, zero before the first fold
    pub(crate) fn mean(&self) -> f64 {
        self.previous_mean
    }

    pub(crate) fn histogram(&self) -> &BTreeMap<u64, u64> {
        &self.histogram
    }
}
