//! Point-in-time histogram snapshot with CDF and percentile markers

use crate::sample::Outcome;
use serde::Serialize;
use std::collections::BTreeMap;

use super::bucket::Bucket;

/// Percentile thresholds tracked by [`HistogramResult`]
pub const P5: f64 = 0.05;
/// 95th percentile threshold
pub const P95: f64 = 0.95;
/// 99th percentile threshold
pub const P99: f64 = 0.99;

/// Read-only view of the latency histogram
///
/// `distribution` maps each observed latency (µs) to a count row. Index 0 of
/// a row is the pool-wide count; when per-client tracking is on, index
/// `i + 1` holds the count for sandbox `i`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramResult {
    /// Latency → counts, in ascending latency order
    pub distribution: BTreeMap<u64, Vec<u64>>,
    /// Latency → cumulative fraction of OK operations at or below it
    pub cdf: BTreeMap<u64, f64>,
    /// First latency whose cumulative fraction reaches 5%
    pub p5: Option<u64>,
    /// First latency whose cumulative fraction reaches 95%
    pub p95: Option<u64>,
    /// First latency whose cumulative fraction reaches 99%
    pub p99: Option<u64>,
    /// Smallest observed latency
    pub min: Option<u64>,
    /// Largest observed latency
    pub max: Option<u64>,
    /// Failed operations by outcome
    pub errors: BTreeMap<Outcome, u64>,
}

impl HistogramResult {
    pub(crate) fn build(
        global: &Bucket,
        clients: Option<&[Bucket]>,
        errors: &BTreeMap<Outcome, u64>,
    ) -> Self {
        let histogram = global.histogram();
        let total: u64 = histogram.values().sum();
        let columns = 1 + clients.map_or(0, <[Bucket]>::len);

        let mut result = Self {
            distribution: BTreeMap::new(),
            cdf: BTreeMap::new(),
            p5: None,
            p95: None,
            p99: None,
            min: None,
            max: None,
            errors: errors.clone(),
        };

        let mut cumulative = 0u64;
        for (&latency, &count) in histogram {
            let mut row = vec![0; columns];
            row[0] = count;
            if let Some(clients) = clients {
                for (id, client) in clients.iter().enumerate() {
                    row[id + 1] = client.histogram().get(&latency).copied().unwrap_or(0);
                }
            }
            result.distribution.insert(latency, row);

            result.min.get_or_insert(latency);
            result.max = Some(latency);

            cumulative += count;
            let fraction = cumulative as f64 / total as f64;
            result.cdf.insert(latency, fraction);

            for (marker, threshold) in [
                (&mut result.p5, P5),
                (&mut result.p95, P95),
                (&mut result.p99, P99),
            ] {
                if marker.is_none() && fraction >= threshold {
                    *marker = Some(latency);
                }
            }
        }

        result
    }

    /// Total OK operations in the snapshot
    pub fn total(&self) -> u64 {
        self.distribution.values().map(|row| row[0]).sum()
    }

    /// Total failed operations across all outcomes
    pub fn total_errors(&self) -> u64 {
        self.errors.values().sum()
    }

    /// Whether no OK operation has been recorded
    pub fn is_empty(&self) -> bool {
        self.distribution.is_empty()
    }

    /// Number of per-client columns in each distribution row
    pub fn client_columns(&self) -> usize {
        self.distribution
            .values()
            .next()
            .map_or(0, |row| row.len().saturating_sub(1))
    }

    /// First latency whose cumulative fraction reaches `quantile`
    pub fn percentile(&self, quantile: f64) -> Option<u64> {
        self.cdf
            .iter()
            .find(|(_, fraction)| **fraction >= quantile)
            .map(|(&latency, _)| latency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket_with(latencies: impl IntoIterator<Item = u64>) -> Bucket {
        let mut bucket = Bucket::default();
        for latency in latencies {
            bucket.record(latency);
        }
        bucket
    }

    #[test]
    fn test_empty_snapshot() {
        let result = HistogramResult::build(&Bucket::default(), None, &BTreeMap::new());
        assert!(result.is_empty());
        assert_eq!(result.total(), 0);
        assert_eq!(result.p5, None);
        assert_eq!(result.min, None);
        assert_eq!(result.max, None);
    }

    #[test]
    fn test_percentiles_on_uniform_latencies() {
        let bucket = bucket_with(1..=100);
        let result = HistogramResult::build(&bucket, None, &BTreeMap::new());

        assert_eq!(result.total(), 100);
        assert_eq!(result.min, Some(1));
        assert_eq!(result.max, Some(100));
        assert_eq!(result.p5, Some(5));
        assert_eq!(result.p95, Some(95));
        assert_eq!(result.p99, Some(99));
        assert_eq!(result.percentile(P95), result.p95);
    }

    #[test]
    fn test_cdf_is_monotone_and_bounded() {
        let bucket = bucket_with([900, 1000, 1000, 1000, 1200, 5000, 20]);
        let result = HistogramResult::build(&bucket, None, &BTreeMap::new());

        let mut last = 0.0;
        for &fraction in result.cdf.values() {
            assert!(fraction >= last);
            assert!((0.0..=1.0).contains(&fraction));
            last = fraction;
        }
        assert!((last - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_markers_are_ordered() {
        let bucket = bucket_with((0..1000).map(|i| (i * 7919) % 3001));
        let result = HistogramResult::build(&bucket, None, &BTreeMap::new());

        let (p5, p95, p99) = (result.p5.unwrap(), result.p95.unwrap(), result.p99.unwrap());
        assert!(p5 <= p95 && p95 <= p99);
    }

    #[test]
    fn test_single_key_sets_every_marker() {
        let bucket = bucket_with([42; 10]);
        let result = HistogramResult::build(&bucket, None, &BTreeMap::new());
        assert_eq!(result.p5, Some(42));
        assert_eq!(result.p99, Some(42));
        assert_eq!(result.min, result.max);
    }

    #[test]
    fn test_per_client_rows() {
        let mut global = Bucket::default();
        let mut clients = vec![Bucket::default(), Bucket::default()];
        for (id, latency) in [(0, 10), (1, 10), (1, 20), (0, 30)] {
            global.record(latency);
            clients[id].record(latency);
        }

        let result = HistogramResult::build(&global, Some(&clients), &BTreeMap::new());
        assert_eq!(result.client_columns(), 2);
        assert_eq!(result.distribution[&10], vec![2, 1, 1]);
        assert_eq!(result.distribution[&20], vec![1, 0, 1]);
        assert_eq!(result.distribution[&30], vec![1, 1, 0]);
    }

    #[test]
    fn test_errors_are_copied() {
        let mut errors = BTreeMap::new();
        errors.insert(Outcome::Timeout, 3);
        errors.insert(Outcome::Error, 4);

        let result = HistogramResult::build(&Bucket::default(), None, &errors);
        assert_eq!(result.total_errors(), 7);
        assert_eq!(result.errors[&Outcome::Timeout], 3);
    }
}
