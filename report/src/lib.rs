//! Reports for finished bam runs
//!
//! - [`TextReport`]: human-readable setup, overview, percentiles and a
//!   tab-delimited CDF table ready to paste into a spreadsheet
//! - [`JsonReport`]: the same data as a JSON document
//! - Helpers for live progress output ([`progress_line`], [`trailer`])

#![warn(missing_docs)]
#![warn(clippy::all)]

mod json;
mod text;

pub use json::JsonReport;
pub use text::{format_micros, progress_line, trailer, TextReport};

use bam_core::{Properties, RunConfig, Statistics};
use std::time::Duration;

/// What was run, as shown in the report header
#[derive(Debug, Clone)]
pub struct RunSetup {
    /// Workload name
    pub workload: String,
    /// Configured worker count
    pub workers: usize,
    /// Configured duration
    pub duration: Duration,
    /// Workload properties
    pub properties: Properties,
}

impl RunSetup {
    /// Describe a run of `workload` under `config`
    pub fn new(workload: impl Into<String>, config: &RunConfig) -> Self {
        Self {
            workload: workload.into(),
            workers: config.workers,
            duration: config.duration,
            properties: config.properties.clone(),
        }
    }
}

/// Per-client columns to render; zero unless client tracking was on
///
/// Every configured sandbox gets a column even when the histogram holds no
/// OK samples at all.
pub(crate) fn client_columns(stats: &dyn Statistics) -> usize {
    if stats.client_tracking() {
        stats
            .histogram()
            .client_columns()
            .max(stats.planned_load())
    } else {
        0
    }
}
