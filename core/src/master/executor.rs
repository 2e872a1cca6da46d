//! Master execution logic

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::calculator::{Calculator, SummaryEvent};
use crate::collector::Collector;
use crate::config::RunConfig;
use crate::error::{BenchError, BenchErrorKind, BenchResult};
use crate::sandbox::SandboxBuilder;
use crate::statistics::RunStatistics;
use crate::traits::WorkloadFactory;

use super::aggregator::aggregate_sandbox_stats;

/// Master lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterState {
    /// Built but not started
    Created,
    /// Sandboxes are working and summaries are being emitted
    Running,
    /// Draining what is left and joining sandboxes
    Dying,
    /// Finished; statistics are available
    Dead,
}

/// Master manages the run lifecycle
///
/// Responsible for spawning sandboxes, driving the calculator, emitting
/// summaries and coordinating shutdown.
pub struct Master {
    /// Run configuration
    pub(crate) config: RunConfig,

    /// Workload factory, invoked once per sandbox
    pub(crate) factory: WorkloadFactory,

    /// Summary event sender; dropping it ends the caller's stream
    pub(crate) summary_tx: mpsc::UnboundedSender<SummaryEvent>,

    /// Stop signal sender
    pub(crate) shutdown_tx: broadcast::Sender<()>,

    /// Subscribed at construction so an early stop is never missed
    pub(crate) shutdown_rx: broadcast::Receiver<()>,

    /// Lifecycle state
    pub(crate) state: watch::Sender<MasterState>,
}

impl Master {
    /// Create a new master
    ///
    /// Use `MasterBuilder` for a more ergonomic construction.
    pub fn new(
        config: RunConfig,
        factory: WorkloadFactory,
        summary_tx: mpsc::UnboundedSender<SummaryEvent>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (state, _) = watch::channel(MasterState::Created);

        Self {
            config,
            factory,
            summary_tx,
            shutdown_tx,
            shutdown_rx,
            state,
        }
    }

    /// Get the run configuration
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Current lifecycle state
    pub fn state(&self) -> MasterState {
        *self.state.borrow()
    }

    /// Start the run on its own task and return a handle to it
    pub fn start(self) -> MasterHandle {
        let shutdown_tx = self.shutdown_tx.clone();
        let state = self.state.subscribe();
        let task = tokio::spawn(self.run());

        MasterHandle {
            shutdown_tx,
            state,
            task,
        }
    }

    /// Run to completion on the current task
    ///
    /// Returns the frozen statistics, or an error if no sandbox could start.
    pub async fn run(self) -> BenchResult<RunStatistics> {
        let Master {
            config,
            factory,
            summary_tx,
            shutdown_tx: _shutdown_tx,
            mut shutdown_rx,
            state,
        } = self;

        let started = Instant::now();
        let started_at = Utc::now();
        state.send_replace(MasterState::Running);

        tracing::info!(
            workers = config.workers,
            duration_secs = config.duration.as_secs_f64(),
            per_client_stats = config.per_client_stats,
            sample_buffer = config.channel.sample_buffer,
            stall = ?config.stall.ops_per_stall,
            "Starting run"
        );

        let (collector, stream) = Collector::new(&config.channel);
        let mut collector_watch = collector.watch();
        let properties = Arc::new(config.properties.clone());

        let mut handles = Vec::with_capacity(config.workers);
        for worker_id in 0..config.workers {
            let sandbox = SandboxBuilder::new(worker_id)
                .factory(Arc::clone(&factory))
                .properties(Arc::clone(&properties))
                .publisher(collector.publisher(worker_id))
                .deadline(started, config.duration)
                .stall(config.stall)
                .build()?;
            handles.push(sandbox.start());
        }
        let collector_handle = collector.start();

        let mut calculator = Calculator::new(stream, config.workers, config.per_client_stats)
            .with_start(started, started_at);

        let first_tick = tokio::time::Instant::from_std(started) + config.summary_interval;
        let mut ticker = tokio::time::interval_at(first_tick, config.summary_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut stopped = false;
        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.recv() => {
                    tracing::info!("Stop requested");
                    stopped = true;
                    break;
                }
                _ = collector_watch.dead() => {
                    tracing::debug!("Collector reported every sandbox complete");
                    break;
                }
                _ = ticker.tick() => {
                    let event = calculator.summarize();
                    let _ = summary_tx.send(event);
                }
                drain = calculator.drain_next(config.drain_batch) => {
                    if drain.closed {
                        break;
                    }
                }
            }
        }

        state.send_replace(MasterState::Dying);

        // Closing first makes in-flight publishers fail and wind down.
        if stopped {
            calculator.close_stream();
        }
        let flushed = calculator.drain_to_end().await;

        let event = calculator.summarize();
        let _ = summary_tx.send(event);
        drop(summary_tx);

        let mut results = Vec::with_capacity(handles.len());
        let mut startup_failures = 0;
        let mut panics = 0;
        for (worker_id, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(Ok(stats)) => results.push(stats),
                Ok(Err(e)) => {
                    startup_failures += 1;
                    tracing::error!(worker_id, error = %e, "Sandbox failed to start");
                }
                Err(e) => {
                    panics += 1;
                    tracing::error!(worker_id, error = %e, "Sandbox task panicked");
                }
            }
        }
        if let Err(e) = collector_handle.await {
            tracing::error!(error = %e, "Collector task panicked");
        }

        let pool = aggregate_sandbox_stats(&results);
        tracing::info!(
            elapsed_secs = event.elapsed_secs(),
            ops = event.ops,
            ops_per_sec = event.ops_per_sec,
            mean_micros = event.mean_response_micros,
            efficiency = event.efficiency,
            errors = pool.errors,
            flushed,
            stopped,
            "Run completed"
        );

        state.send_replace(MasterState::Dead);

        if results.is_empty() {
            if startup_failures > 0 {
                return Err(BenchError::new(
                    BenchErrorKind::Startup,
                    format!("all {startup_failures} sandboxes failed to start"),
                ));
            }
            if panics > 0 {
                return Err(BenchError::orchestration(format!(
                    "all {panics} sandboxes panicked"
                )));
            }
        }

        Ok(calculator.into_statistics(pool, startup_failures))
    }
}

impl std::fmt::Debug for Master {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Master")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

/// Handle to a started master
#[derive(Debug)]
pub struct MasterHandle {
    shutdown_tx: broadcast::Sender<()>,
    state: watch::Receiver<MasterState>,
    task: JoinHandle<BenchResult<RunStatistics>>,
}

impl MasterHandle {
    /// Ask the master to wind down early
    ///
    /// Sandboxes stop at their next publish; statistics cover the partial
    /// run. Calling this more than once is harmless.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Current lifecycle state
    pub fn state(&self) -> MasterState {
        *self.state.borrow()
    }

    /// Watch lifecycle transitions
    pub fn subscribe(&self) -> watch::Receiver<MasterState> {
        self.state.clone()
    }

    /// Wait for the master to reach `Dead` and return its statistics
    pub async fn wait(self) -> BenchResult<RunStatistics> {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(BenchError::shutdown()),
            Err(e) => Err(BenchError::orchestration(format!(
                "master task panicked: {e}"
            ))),
        }
    }

    /// Wait like [`MasterHandle::wait`], stopping early on Ctrl+C
    pub async fn wait_with_signal_handling(self) -> BenchResult<RunStatistics> {
        let shutdown_tx = self.shutdown_tx.clone();

        let signal_handle = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Received Ctrl+C, stopping run...");
                    let _ = shutdown_tx.send(());
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                }
            }
        });

        let result = self.wait().await;

        signal_handle.abort();

        result
    }
}
