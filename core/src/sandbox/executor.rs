//! Sandbox execution loop

use crate::collector::Publisher;
use crate::error::{BenchError, BenchResult};
use crate::sample::Sample;
use crate::traits::{Properties, WorkloadFactory};

use super::stall::{StallPolicy, Staller};
use super::stats::SandboxStats;

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Sandbox runs one workload in a loop: work -> time -> publish -> repeat
///
/// The loop ends when `start + duration` has passed. Every sandbox of a run
/// shares the same `start`, so they converge on one deadline without any
/// cancellation being delivered to them. A sandbox also stops early if the
/// sample channel has been closed by the consumer.
pub struct Sandbox {
    /// Unique sandbox identifier
    id: usize,

    /// Produces this sandbox's workload instance
    factory: WorkloadFactory,

    /// Properties handed to `init`
    properties: Arc<Properties>,

    /// Shared run start time
    start: Instant,

    /// Shared run duration
    duration: Duration,

    /// Sample channel handle; dropping it marks this sandbox complete
    publisher: Publisher,

    /// Optional throttling
    stall: StallPolicy,
}

impl Sandbox {
    /// Create a new sandbox
    ///
    /// Use `SandboxBuilder` for a more ergonomic construction.
    pub fn new(
        id: usize,
        factory: WorkloadFactory,
        properties: Arc<Properties>,
        start: Instant,
        duration: Duration,
        publisher: Publisher,
        stall: StallPolicy,
    ) -> Self {
        Self {
            id,
            factory,
            properties,
            start,
            duration,
            publisher,
            stall,
        }
    }

    /// Spawn the loop on its own task and return immediately
    pub fn start(self) -> JoinHandle<BenchResult<SandboxStats>> {
        tokio::spawn(self.run())
    }

    /// Run the sandbox loop to completion
    ///
    /// Returns an error only when the workload fails to initialize.
    pub async fn run(self) -> BenchResult<SandboxStats> {
        let Sandbox {
            id,
            factory,
            properties,
            start,
            duration,
            publisher,
            stall,
        } = self;

        let mut stats = SandboxStats::new(id);
        let mut workload = factory();

        if let Err(e) = workload.init(&properties).await {
            tracing::warn!(
                worker_id = id,
                workload = workload.name(),
                error = %e,
                "Workload init failed"
            );
            return Err(BenchError::startup(id, e));
        }

        tracing::debug!(worker_id = id, workload = workload.name(), "Sandbox started");
        stats.start();
        let mut staller = Staller::new(stall);

        while start.elapsed() < duration {
            let t0 = Instant::now();
            let outcome = match workload.work(t0).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::trace!(worker_id = id, error = %e, "Operation failed");
                    e.to_outcome()
                }
            };
            let latency_micros = t0.elapsed().as_micros() as u64;

            if staller.after_op().await {
                stats.record_stall();
            }

            let sample = Sample::new(id, latency_micros, outcome);
            if publisher.publish(sample).await.is_err() {
                tracing::debug!(worker_id = id, "Sample channel closed, sandbox stopping");
                break;
            }
            stats.record(outcome);
        }

        if let Err(e) = workload.close().await {
            tracing::warn!(worker_id = id, error = %e, "Workload close failed");
        }

        stats.stop();
        drop(publisher);

        tracing::debug!(
            worker_id = id,
            completed = stats.completed,
            errors = stats.errors,
            stalls = stats.stalls,
            elapsed_ms = ?stats.elapsed().map(|d| d.as_millis()),
            "Sandbox finished"
        );

        Ok(stats)
    }

    /// Get the sandbox ID
    pub fn id(&self) -> usize {
        self.id
    }
}

impl std::fmt::Debug for Sandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sandbox")
            .field("id", &self.id)
            .field("duration", &self.duration)
            .field("stall", &self.stall)
            .finish()
    }
}
