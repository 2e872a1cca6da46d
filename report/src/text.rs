//! Human-readable report

use anyhow::Result;
use bam_core::{HistogramResult, Outcome, Statistics, SummaryEvent};
use std::fmt::Write as _;
use std::io::Write;

use crate::{client_columns, RunSetup};

/// Render a latency in the most readable unit
pub fn format_micros(micros: u64) -> String {
    match micros {
        0..=999 => format!("{micros}µs"),
        1_000..=999_999 => format!("{:.3}ms", micros as f64 / 1e3),
        _ => format!("{:.3}s", micros as f64 / 1e6),
    }
}

fn format_marker(marker: Option<u64>) -> String {
    marker.map_or_else(|| "n/a".to_string(), format_micros)
}

/// One line of live progress for a summary event
pub fn progress_line(event: &SummaryEvent) -> String {
    format!(
        "Runtime: {:4.0}s, Throughput (ops/sec): {:8.3}, Response Time (µs): {:8.3}, Efficiency (%): {:2.3}",
        event.elapsed_secs(),
        event.ops_per_sec,
        event.mean_response_micros,
        event.efficiency * 100.0
    )
}

/// One-line digest printed when the run ends
pub fn trailer(histogram: &HistogramResult) -> String {
    format!(
        "Time's up! Fastest: {}, Percentiles: [5th: {}, 95th: {}, 99th: {}], Slowest: {}",
        format_marker(histogram.min),
        format_marker(histogram.p5),
        format_marker(histogram.p95),
        format_marker(histogram.p99),
        format_marker(histogram.max),
    )
}

/// Text report writer
#[derive(Debug, Clone)]
pub struct TextReport {
    setup: RunSetup,
}

impl TextReport {
    /// Create a report for the given setup
    pub fn new(setup: RunSetup) -> Self {
        Self { setup }
    }

    /// Render the full report
    pub fn render(&self, stats: &dyn Statistics) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.render_into(&mut out, stats);
        out
    }

    /// Write the full report to `writer`
    pub fn write_to<W: Write>(&self, mut writer: W, stats: &dyn Statistics) -> Result<()> {
        writer.write_all(self.render(stats).as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    fn render_into(&self, out: &mut String, stats: &dyn Statistics) -> std::fmt::Result {
        let histogram = stats.histogram();

        writeln!(out, "Setup")?;
        writeln!(out, "-----")?;
        writeln!(out)?;
        writeln!(out, "workload={}", self.setup.workload)?;
        writeln!(out, "clients={}", self.setup.workers)?;
        writeln!(out, "duration={}", self.setup.duration.as_secs())?;
        for (key, value) in &self.setup.properties {
            writeln!(out, "{key}={value}")?;
        }
        writeln!(out, "\n")?;

        writeln!(out, "Overview")?;
        writeln!(out, "--------")?;
        writeln!(out)?;
        writeln!(out, "Started:\t{}", stats.started_at().to_rfc3339())?;
        writeln!(out, "Run Time (s):\t{:8.4}", stats.elapsed().as_secs_f64())?;
        writeln!(out, "Throughput (ops/sec):\t{:.6}", stats.throughput())?;
        writeln!(out, "Mean Response Time (µs):\t{:8.4}", stats.mean_response_micros())?;
        writeln!(out, "Load Efficiency (%):\t{:.6}", stats.efficiency() * 100.0)?;
        writeln!(out)?;

        writeln!(out, "Response Time Details:")?;
        writeln!(out, "  Min: {}", format_marker(histogram.min))?;
        writeln!(out, "  Max: {}", format_marker(histogram.max))?;
        writeln!(out, "  Mean: {:8.4}µs", stats.mean_response_micros())?;
        writeln!(out, "  5th Percentile: {}", format_marker(histogram.p5))?;
        writeln!(out, "  95th Percentile: {}", format_marker(histogram.p95))?;
        writeln!(out, "  99th Percentile: {}", format_marker(histogram.p99))?;
        writeln!(out)?;

        writeln!(out, "Errors:")?;
        for outcome in Outcome::ALL.iter().filter(|o| o.is_error()) {
            let count = stats.errors().get(outcome).copied().unwrap_or(0);
            writeln!(out, "  {outcome}: {count}")?;
        }
        writeln!(out, "\n")?;

        self.render_table(out, stats)
    }

    fn render_table(&self, out: &mut String, stats: &dyn Statistics) -> std::fmt::Result {
        let histogram = stats.histogram();

        writeln!(out, "Response Time CDF and Frequency Histogram")?;
        writeln!(out, "-----------------------------------------")?;
        writeln!(out, "(tab-delimited; paste into a spreadsheet)")?;
        writeln!(out)?;

        let mut headers = vec!["usec".to_string(), "CDF".to_string(), "total".to_string()];
        let clients = client_columns(stats);
        headers.extend((0..clients).map(|id| format!("client-{id}")));
        let spacers: Vec<String> = headers.iter().map(|h| "-".repeat(h.len())).collect();
        writeln!(out, "{}", headers.join("\t"))?;
        writeln!(out, "{}", spacers.join("\t"))?;

        for (latency, counts) in &histogram.distribution {
            let cdf = histogram.cdf.get(latency).copied().unwrap_or(0.0);
            let mut row = vec![latency.to_string(), format!("{cdf:2.6}")];
            row.extend(
                (0..=clients).map(|column| counts.get(column).copied().unwrap_or(0).to_string()),
            );
            writeln!(out, "{}", row.join("\t"))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{all_errors, run_statistics};
    use bam_core::{Properties, RunConfig};
    use std::time::Duration;

    fn setup() -> RunSetup {
        let config = RunConfig::new(2)
            .with_duration(Duration::from_secs(5))
            .with_properties(Properties::from([("sleep.micros".to_string(), "1000".to_string())]));
        RunSetup::new("sleep", &config)
    }

    #[test]
    fn test_format_micros_units() {
        assert_eq!(format_micros(0), "0µs");
        assert_eq!(format_micros(999), "999µs");
        assert_eq!(format_micros(1_500), "1.500ms");
        assert_eq!(format_micros(2_250_000), "2.250s");
    }

    #[test]
    fn test_trailer() {
        let stats = run_statistics(false);
        assert_eq!(
            trailer(&stats.histogram),
            "Time's up! Fastest: 900µs, Percentiles: [5th: 900µs, 95th: 1.500ms, 99th: 1.500ms], Slowest: 1.500ms"
        );
    }

    #[test]
    fn test_trailer_without_samples() {
        let mut stats = run_statistics(false);
        stats.histogram.min = None;
        stats.histogram.p5 = None;
        assert!(trailer(&stats.histogram).contains("Fastest: n/a"));
        assert!(trailer(&stats.histogram).contains("5th: n/a"));
    }

    #[test]
    fn test_progress_line() {
        let event = SummaryEvent {
            elapsed: Duration::from_secs(4),
            mean_response_micros: 1000.5,
            ops_per_sec: 3999.0,
            efficiency: 0.9876,
            ops: 16_000,
        };
        let line = progress_line(&event);
        assert!(line.starts_with("Runtime:    4s"));
        assert!(line.contains("3999.000"));
        assert!(line.contains("1000.500"));
        assert!(line.contains("98.760"));
    }

    #[test]
    fn test_report_sections() {
        let report = TextReport::new(setup()).render(&run_statistics(false));

        for section in ["Setup", "Overview", "Response Time Details:", "Errors:"] {
            assert!(report.contains(section), "missing {section}");
        }
        assert!(report.contains("clients=2"));
        assert!(report.contains("duration=5"));
        assert!(report.contains("sleep.micros=1000"));
        assert!(report.contains("  timeout: 2"));
        assert!(report.contains("  error: 0"));
        assert!(report.contains("2024-01-02T03:04:05"));
    }

    #[test]
    fn test_table_without_client_tracking() {
        let report = TextReport::new(setup()).render(&run_statistics(false));
        assert!(report.contains("usec\tCDF\ttotal\n----\t---\t-----\n"));
        assert!(report.contains("1000\t0.750000\t2\n"));
        assert!(!report.contains("client-0"));
    }

    #[test]
    fn test_table_with_client_tracking() {
        let report = TextReport::new(setup()).render(&run_statistics(true));
        assert!(report.contains("usec\tCDF\ttotal\tclient-0\tclient-1\n"));
        assert!(report.contains("1000\t0.750000\t2\t1\t1\n"));
        assert!(report.contains("1500\t1.000000\t1\t0\t1\n"));
    }

    #[test]
    fn test_table_keeps_client_columns_without_ok_samples() {
        let report = TextReport::new(setup()).render(&all_errors());
        assert!(report.contains("usec\tCDF\ttotal\tclient-0\tclient-1\n"));
        assert!(report.contains("  timeout: 2"));
    }

    #[test]
    fn test_write_to() {
        let mut buf = Vec::new();
        TextReport::new(setup())
            .write_to(&mut buf, &run_statistics(false))
            .unwrap();
        assert!(String::from_utf8(buf).unwrap().starts_with("Setup\n"));
    }
}
