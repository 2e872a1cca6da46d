//! Calculator module: streaming statistics over the sample stream
//!
//! The calculator is owned by the master's orchestration task, so none of
//! its state needs locking. It has three jobs:
//!
//! - **drain**: pull a bounded batch of samples off the stream and record
//!   them (OK latencies into the histograms, everything else into the error
//!   counters)
//! - **summarize**: fold the interval recorded since the last fold into the
//!   weighted running mean and emit a [`SummaryEvent`]
//! - **snapshot**: build a [`HistogramResult`] with CDF and percentiles
//!
//! # Example
//!
//! ```ignore
//! let mut calculator = Calculator::new(stream, workers, per_client);
//! while !calculator.drain_next(64).await.closed {}
//! let event = calculator.summarize();
//! let histogram = calculator.snapshot();
//! ```

mod bucket;
mod histogram;
mod summary;

pub use histogram::{HistogramResult, P5, P95, P99};
pub use summary::SummaryEvent;

use crate::collector::SampleStream;
use crate::master::PoolStats;
use crate::sample::{Outcome, Sample};
use crate::statistics::{ClientStatistics, RunStatistics};

use bucket::{Bucket, Fold};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::error::TryRecvError;

/// Floor for the reported mean response time, in microseconds
pub const MEAN_EPSILON_MICROS: f64 = 1e-9;

/// Outcome of one drain call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Drain {
    /// Samples recorded by this call
    pub received: usize,
    /// The stream has ended and every buffered sample was consumed
    pub closed: bool,
}

/// Streaming statistics engine
pub struct Calculator {
    stream: SampleStream,
    planned_load: usize,
    global: Bucket,
    clients: Option<Vec<Bucket>>,
    errors: BTreeMap<Outcome, u64>,
    started: Instant,
    started_at: DateTime<Utc>,
    /// Elapsed time at the most recent fold
    elapsed: Duration,
}

impl Calculator {
    /// Create a calculator reading from `stream`
    ///
    /// `planned_load` is the configured worker count; it is the denominator
    /// of the efficiency estimate and sizes the per-client buckets.
    pub fn new(stream: SampleStream, planned_load: usize, per_client: bool) -> Self {
        Self {
            stream,
            planned_load,
            global: Bucket::default(),
            clients: per_client.then(|| vec![Bucket::default(); planned_load]),
            errors: BTreeMap::new(),
            started: Instant::now(),
            started_at: Utc::now(),
            elapsed: Duration::ZERO,
        }
    }

    /// Measure elapsed time from a run start taken elsewhere
    pub fn with_start(mut self, started: Instant, started_at: DateTime<Utc>) -> Self {
        self.started = started;
        self.started_at = started_at;
        self
    }

    /// Record one sample
    pub fn record(&mut self, sample: Sample) {
        if sample.outcome.is_error() {
            *self.errors.entry(sample.outcome).or_insert(0) += 1;
            return;
        }

        self.global.record(sample.latency_micros);
        if let Some(clients) = &mut self.clients {
            if sample.worker_id >= clients.len() {
                clients.resize_with(sample.worker_id + 1, Bucket::default);
            }
            clients[sample.worker_id].record(sample.latency_micros);
        }
    }

    /// Record up to `max` samples that are already waiting, without blocking
    pub fn drain(&mut self, max: usize) -> Drain {
        let mut drain = Drain::default();
        while drain.received < max {
            match self.stream.try_recv() {
                Ok(sample) => {
                    self.record(sample);
                    drain.received += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    drain.closed = true;
                    break;
                }
            }
        }
        drain
    }

    /// Wait for at least one sample (or the end of the stream), then drain
    /// whatever else is pending up to `max` in total
    ///
    /// Cancel safe: a dropped call never loses a sample.
    pub async fn drain_next(&mut self, max: usize) -> Drain {
        match self.stream.recv().await {
            Some(sample) => {
                self.record(sample);
                let mut drain = self.drain(max.saturating_sub(1));
                drain.received += 1;
                drain
            }
            None => Drain {
                received: 0,
                closed: true,
            },
        }
    }

    /// Record every remaining sample until the stream ends
    pub async fn drain_to_end(&mut self) -> usize {
        let mut received = 0;
        while let Some(sample) = self.stream.recv().await {
            self.record(sample);
            received += 1;
        }
        received
    }

    /// Refuse further samples; buffered samples can still be drained
    pub fn close_stream(&mut self) {
        self.stream.close();
    }

    /// Fold the current interval, measuring elapsed time from the run start
    pub fn summarize(&mut self) -> SummaryEvent {
        let elapsed = self.started.elapsed();
        self.summarize_at(elapsed)
    }

    /// Fold the current interval as if `elapsed` had passed since the start
    pub fn summarize_at(&mut self, elapsed: Duration) -> SummaryEvent {
        if self.global.fold() == Fold::Discarded {
            tracing::warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                "Running mean became non-finite, interval discarded"
            );
        }
        if let Some(clients) = &mut self.clients {
            for (worker_id, client) in clients.iter_mut().enumerate() {
                if client.fold() == Fold::Discarded {
                    tracing::warn!(worker_id, "Client running mean became non-finite");
                }
            }
        }
        self.elapsed = elapsed;

        SummaryEvent {
            elapsed,
            mean_response_micros: self.mean_response_micros(),
            ops_per_sec: self.throughput(),
            efficiency: self.efficiency(),
            ops: self.global.folded_ops(),
        }
    }

    /// Build a histogram snapshot from the current state
    pub fn snapshot(&self) -> HistogramResult {
        HistogramResult::build(&self.global, self.clients.as_deref(), &self.errors)
    }

    /// Mean OK latency in microseconds, never below [`MEAN_EPSILON_MICROS`]
    pub fn mean_response_micros(&self) -> f64 {
        self.global.mean().max(MEAN_EPSILON_MICROS)
    }

    /// Folded OK operations per second, as of the last fold
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.global.folded_ops() as f64 / secs
        } else {
            0.0
        }
    }

    /// Busy fraction of the planned load, by Little's law
    ///
    /// Short overshoots above 1.0 are expected and not an error.
    pub fn efficiency(&self) -> f64 {
        let concurrency = self.global.mean() * self.throughput() / 1e6;
        concurrency / self.planned_load.max(1) as f64
    }

    /// OK operations folded so far
    pub fn ops(&self) -> u64 {
        self.global.folded_ops()
    }

    /// OK operations recorded but not yet folded
    pub fn pending_ops(&self) -> u64 {
        self.global.pending_ops()
    }

    /// Failed operations by outcome
    pub fn errors(&self) -> &BTreeMap<Outcome, u64> {
        &self.errors
    }

    /// Whether per-client buckets are kept
    pub fn client_tracking(&self) -> bool {
        self.clients.is_some()
    }

    /// The configured worker count
    pub fn planned_load(&self) -> usize {
        self.planned_load
    }

    /// Freeze the calculator into the final run statistics
    pub fn into_statistics(self, pool: PoolStats, startup_failures: usize) -> RunStatistics {
        let histogram = self.snapshot();
        let clients = self.clients.as_ref().map(|clients| {
            clients
                .iter()
                .enumerate()
                .map(|(worker_id, bucket)| ClientStatistics {
                    worker_id,
                    ops: bucket.folded_ops(),
                    mean_response_micros: bucket.mean().max(MEAN_EPSILON_MICROS),
                    histogram: bucket.histogram().clone(),
                })
                .collect()
        });

        RunStatistics {
            started_at: self.started_at,
            elapsed: self.elapsed,
            planned_load: self.planned_load,
            ops: self.ops(),
            mean_response_micros: self.mean_response_micros(),
            ops_per_sec: self.throughput(),
            efficiency: self.efficiency(),
            histogram,
            clients,
            pool,
            startup_failures,
        }
    }
}

impl std::fmt::Debug for Calculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Calculator")
            .field("planned_load", &self.planned_load)
            .field("ops", &self.global.folded_ops())
            .field("pending_ops", &self.global.pending_ops())
            .field("client_tracking", &self.clients.is_some())
            .finish()
    }
}
