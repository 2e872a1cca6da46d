//! CLI argument parsing and run dispatch

use anyhow::{bail, Context, Result};
use bam_core::{MasterBuilder, Properties, RunConfig, Statistics};
use bam_report::{progress_line, trailer, JsonReport, RunSetup, TextReport};
use bam_workloads::WorkloadRegistry;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Shortest accepted run, in seconds
pub const MIN_DURATION_SECS: u64 = 5;

/// bam - drive many concurrent clients against a workload and measure latency
#[derive(Parser, Debug)]
#[command(name = "bam")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Number of concurrent clients (sandboxes)
    #[arg(short, long, value_name = "CLIENTS", default_value_t = 1)]
    pub clients: usize,

    /// Run duration in seconds (at least 5)
    #[arg(short, long, value_name = "SECONDS", default_value_t = 10)]
    pub duration: u64,

    /// Workload to run (see --list-workloads)
    #[arg(short, long, default_value = "sleep")]
    pub workload: String,

    /// Workload property as key:value; repeatable
    #[arg(short, long = "property", value_name = "KEY:VALUE", value_parser = parse_property)]
    pub properties: Vec<(String, String)>,

    /// Keep a latency histogram per client
    #[arg(long)]
    pub per_client_stats: bool,

    /// Interval between progress summaries, in milliseconds
    #[arg(long, value_name = "MILLIS", default_value_t = 2000)]
    pub summary_interval_ms: u64,

    /// Also write the report as JSON to this path
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// List the available workloads and exit
    #[arg(long)]
    pub list_workloads: bool,

    /// Print progress and the closing digest to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parse a `key:value` property
fn parse_property(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once(':') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected key:value, got {raw:?}")),
    }
}

impl Cli {
    /// Build and validate the run configuration
    ///
    /// Out-of-range client counts and durations are raised to their minimum
    /// rather than rejected.
    pub fn run_config(&self) -> Result<RunConfig> {
        let workers = self.clients.max(1);
        let duration = self.duration.max(MIN_DURATION_SECS);
        if duration != self.duration {
            tracing::warn!(
                requested = self.duration,
                used = duration,
                "Duration raised to the minimum"
            );
        }

        let properties: Properties = self.properties.iter().cloned().collect();
        let config = RunConfig::new(workers)
            .with_duration(Duration::from_secs(duration))
            .with_per_client_stats(self.per_client_stats)
            .with_properties(properties)
            .with_summary_interval(Duration::from_millis(self.summary_interval_ms))
            .with_internal_properties()
            .context("invalid internal property")?;

        config.validate().context("invalid run configuration")?;
        Ok(config)
    }

    /// Run the benchmark based on CLI arguments
    pub async fn run(&self) -> Result<()> {
        let registry = WorkloadRegistry::builtin();

        if self.list_workloads {
            for (name, description) in registry.describe() {
                println!("{name:<8} {description}");
            }
            return Ok(());
        }

        let factory = registry.factory(&self.workload)?;
        let config = self.run_config()?;
        let setup = RunSetup::new(&self.workload, &config);

        tracing::info!(
            workload = %self.workload,
            clients = config.workers,
            duration_secs = config.duration.as_secs(),
            "bam starting"
        );

        let (master, mut summaries) = MasterBuilder::new()
            .config(config)
            .factory(factory)
            .build()?;

        let run = tokio::spawn(master.start().wait_with_signal_handling());

        while let Some(event) = summaries.recv().await {
            if self.verbose {
                eprint!("\r{}", progress_line(&event));
            }
        }

        let stats = run.await.context("run task failed")??;

        if self.verbose {
            eprintln!();
            eprintln!("{}", trailer(stats.histogram()));
        }
        if stats.startup_failures > 0 {
            tracing::warn!(
                failed = stats.startup_failures,
                "Some clients failed to start; results cover the rest"
            );
        }

        TextReport::new(setup.clone()).write_to(std::io::stdout().lock(), &stats)?;

        if let Some(path) = &self.json {
            JsonReport::new(setup).write(path, &stats)?;
            tracing::info!(path = %path.display(), "JSON report written");
        }

        if stats.histogram().is_empty() && stats.errors().is_empty() {
            bail!("no operations completed");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bam_core::{OPS_PER_STALL_PROPERTY, SAMPLE_BUFFER_PROPERTY};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("bam").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.clients, 1);
        assert_eq!(cli.duration, 10);
        assert_eq!(cli.workload, "sleep");
        assert_eq!(cli.summary_interval_ms, 2000);
        assert!(!cli.verbose);

        let config = cli.run_config().unwrap();
        assert_eq!(config.duration, Duration::from_secs(10));
        assert_eq!(config.summary_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_short_flags_and_properties() {
        let cli = parse(&[
            "-c", "8", "-d", "30", "-w", "jitter", "-p", "jitter.min_micros:10", "-p",
            "jitter.max_micros: 20", "-v",
        ]);

        let config = cli.run_config().unwrap();
        assert_eq!(config.workers, 8);
        assert_eq!(config.duration, Duration::from_secs(30));
        assert_eq!(config.properties["jitter.min_micros"], "10");
        assert_eq!(config.properties["jitter.max_micros"], "20");
        assert!(cli.verbose);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let config = parse(&["-c", "0", "-d", "1"]).run_config().unwrap();
        assert_eq!(config.workers, 1);
        assert_eq!(config.duration, Duration::from_secs(MIN_DURATION_SECS));
    }

    #[test]
    fn test_internal_properties() {
        let buffer = format!("{SAMPLE_BUFFER_PROPERTY}:64");
        let stall = format!("{OPS_PER_STALL_PROPERTY}:50000");
        let config = parse(&["-p", &buffer, "-p", &stall]).run_config().unwrap();

        assert_eq!(config.channel.sample_buffer, 64);
        assert_eq!(config.stall.ops_per_stall, Some(50_000));

        let bad = format!("{OPS_PER_STALL_PROPERTY}:5");
        assert!(parse(&["-p", &bad]).run_config().is_err());
    }

    #[test]
    fn test_property_parser() {
        assert_eq!(
            parse_property("a:b:c").unwrap(),
            ("a".to_string(), "b:c".to_string())
        );
        assert!(parse_property("novalue").is_err());
        assert!(parse_property(":x").is_err());
        assert!(Cli::try_parse_from(["bam", "-p", "broken"]).is_err());
    }

    #[test]
    fn test_zero_summary_interval_rejected() {
        assert!(parse(&["--summary-interval-ms", "0"]).run_config().is_err());
    }
}
