//! JSON export

use anyhow::{Context, Result};
use bam_core::Statistics;
use serde_json::{json, Value};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::{client_columns, RunSetup};

/// JSON report writer
#[derive(Debug, Clone)]
pub struct JsonReport {
    setup: RunSetup,
}

impl JsonReport {
    /// Create a report for the given setup
    pub fn new(setup: RunSetup) -> Self {
        Self { setup }
    }

    /// Build the report document
    pub fn to_value(&self, stats: &dyn Statistics) -> Value {
        let histogram = stats.histogram();

        let distribution: Vec<_> = histogram
            .distribution
            .iter()
            .map(|(latency, counts)| {
                let mut row = json!({
                    "usec": latency,
                    "cdf": histogram.cdf.get(latency).copied().unwrap_or(0.0),
                    "total": counts[0],
                });
                if stats.client_tracking() {
                    row["clients"] = json!(&counts[1..]);
                }
                row
            })
            .collect();

        let errors: serde_json::Map<String, Value> = stats
            .errors()
            .iter()
            .map(|(outcome, count)| (outcome.to_string(), json!(count)))
            .collect();

        let clients: Option<Vec<_>> = stats.client_tracking().then(|| {
            (0..client_columns(stats))
                .map(|id| {
                    json!({
                        "client": id,
                        "ops": stats
                            .client_histogram(id)
                            .map(|h| h.values().sum::<u64>())
                            .unwrap_or(0),
                        "mean_usec": stats.client_mean_micros(id),
                    })
                })
                .collect()
        });

        json!({
            "setup": {
                "workload": self.setup.workload,
                "clients": self.setup.workers,
                "duration_secs": self.setup.duration.as_secs(),
                "properties": self.setup.properties,
            },
            "overview": {
                "started_at": stats.started_at().to_rfc3339(),
                "run_time_secs": stats.elapsed().as_secs_f64(),
                "throughput_ops_per_sec": stats.throughput(),
                "mean_response_usec": stats.mean_response_micros(),
                "efficiency": stats.efficiency(),
                "planned_load": stats.planned_load(),
            },
            "response_time": {
                "ops": histogram.total(),
                "min_usec": histogram.min,
                "max_usec": histogram.max,
                "p5_usec": histogram.p5,
                "p95_usec": histogram.p95,
                "p99_usec": histogram.p99,
            },
            "errors": errors,
            "distribution": distribution,
            "clients": clients,
        })
    }

    /// Write the report to `path`, pretty-printed
    pub fn write(&self, path: impl AsRef<Path>, stats: &dyn Statistics) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.to_value(stats))
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{all_errors, run_statistics};
    use bam_core::RunConfig;
    use std::time::Duration;

    fn report() -> JsonReport {
        let config = RunConfig::new(2)
            .with_duration(Duration::from_secs(5))
            .with_property("sleep.micros", "1000");
        JsonReport::new(RunSetup::new("sleep", &config))
    }

    #[test]
    fn test_json_summary_fields() {
        let value = report().to_value(&run_statistics(false));

        assert_eq!(value["setup"]["workload"], "sleep");
        assert_eq!(value["setup"]["clients"], 2);
        assert_eq!(value["setup"]["properties"]["sleep.micros"], "1000");
        assert_eq!(value["overview"]["throughput_ops_per_sec"], 2.0);
        assert_eq!(value["response_time"]["ops"], 4);
        assert_eq!(value["response_time"]["p95_usec"], 1500);
        assert_eq!(value["errors"]["timeout"], 2);
        assert!(value["clients"].is_null());
    }

    #[test]
    fn test_json_distribution_rows() {
        let value = report().to_value(&run_statistics(true));
        let rows = value["distribution"].as_array().unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1]["usec"], 1000);
        assert_eq!(rows[1]["cdf"], 0.75);
        assert_eq!(rows[1]["total"], 2);
        assert_eq!(rows[1]["clients"], json!([1, 1]));

        let clients = value["clients"].as_array().unwrap();
        assert_eq!(clients.len(), 2);
        assert_eq!(clients[1]["mean_usec"], 1250.0);
        assert_eq!(clients[1]["ops"], 2);
    }

    #[test]
    fn test_json_lists_clients_without_ok_samples() {
        let value = report().to_value(&all_errors());

        assert!(value["distribution"].as_array().unwrap().is_empty());
        let clients = value["clients"].as_array().unwrap();
        assert_eq!(clients.len(), 2);
        assert_eq!(clients[0]["client"], 0);
        assert_eq!(clients[1]["ops"], 0);
    }

    #[test]
    fn test_json_write_to_file() {
        let path = std::env::temp_dir().join(format!("bam-report-{}.json", std::process::id()));
        report().write(&path, &run_statistics(false)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["setup"]["duration_secs"], 5);

        std::fs::remove_file(&path).unwrap();
    }
}
