//! bam-core: the concurrency and statistics engine of the bam load generator
//!
//! This crate drives many independent simulated clients against a pluggable
//! workload and measures what they see:
//!
//! - Core types ([`Outcome`], [`Sample`]) and the [`Workload`] capability
//! - Sandboxes that run one workload instance each until a shared deadline
//! - The collector that funnels samples into a single bounded stream
//! - The streaming calculator (histogram, weighted mean, CDF, efficiency)
//! - The master that ties lifecycle, periodic summaries and shutdown together
//! - Error handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod calculator;
pub mod channel;
pub mod collector;
pub mod config;
pub mod error;
pub mod master;
pub mod sample;
pub mod sandbox;
pub mod statistics;
pub mod traits;

#[cfg(test)]
mod testing;

pub use calculator::{Calculator, Drain, HistogramResult, SummaryEvent, MEAN_EPSILON_MICROS};
pub use channel::{ChannelConfig, SAMPLE_BUFFER_PROPERTY};
pub use collector::{Collector, CollectorState, CompletionTracker, Publisher, SampleStream};
pub use config::{ConfigError, RunConfig};
pub use error::*;
pub use master::{Master, MasterBuilder, MasterHandle, MasterState, PoolStats};
pub use sample::{Outcome, Sample};
pub use sandbox::{Sandbox, SandboxBuilder, SandboxStats, StallPolicy, OPS_PER_STALL_PROPERTY};
pub use statistics::{ClientStatistics, RunStatistics, Statistics};
pub use traits::*;
