//! Sample collector: the single rendezvous point for sandbox output
//!
//! Every sandbox publishes into one bounded channel through its own
//! [`Publisher`]. The [`Collector`] task watches a [`CompletionTracker`];
//! once the last publisher is gone it drops its own sender, which ends the
//! [`SampleStream`] for the consumer instead of leaving it blocked forever.

use crate::channel::ChannelConfig;
use crate::sample::Sample;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;

/// Counts live sandboxes and wakes waiters when the count reaches zero
#[derive(Debug, Default)]
pub struct CompletionTracker {
    live: AtomicUsize,
    idle: Notify,
}

impl CompletionTracker {
    /// Create an empty tracker
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register one more live sandbox; it completes when the guard drops
    pub fn register(self: &Arc<Self>) -> CompletionGuard {
        self.live.fetch_add(1, Ordering::SeqCst);
        CompletionGuard {
            tracker: Arc::clone(self),
        }
    }

    /// Number of sandboxes that have not completed yet
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Wait until every registered sandbox has completed
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.live() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn complete_one(&self) {
        if self.live.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Marks one sandbox as live for as long as it exists
#[derive(Debug)]
pub struct CompletionGuard {
    tracker: Arc<CompletionTracker>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.tracker.complete_one();
    }
}

/// Returned by [`Publisher::publish`] once the consumer has gone away
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("sample channel closed")]
pub struct ChannelClosed;

/// A sandbox's handle onto the sample channel
///
/// Dropping the publisher releases the sender first and then signals
/// completion to the tracker.
#[derive(Debug)]
pub struct Publisher {
    worker_id: usize,
    tx: mpsc::Sender<Sample>,
    _guard: CompletionGuard,
}

impl Publisher {
    /// Hand a sample to the collector, waiting while the channel is full
    ///
    /// This is the backpressure point: a slow consumer throttles every
    /// producer instead of dropping samples.
    pub async fn publish(&self, sample: Sample) -> Result<(), ChannelClosed> {
        self.tx.send(sample).await.map_err(|_| ChannelClosed)
    }

    /// The sandbox this publisher belongs to
    pub fn worker_id(&self) -> usize {
        self.worker_id
    }
}

/// Read side of the sample channel
#[derive(Debug)]
pub struct SampleStream {
    rx: mpsc::Receiver<Sample>,
}

impl SampleStream {
    pub(crate) fn new(rx: mpsc::Receiver<Sample>) -> Self {
        Self { rx }
    }

    /// Wait for the next sample; `None` once the stream has ended
    pub async fn recv(&mut self) -> Option<Sample> {
        self.rx.recv().await
    }

    /// Take a pending sample without waiting
    pub fn try_recv(&mut self) -> Result<Sample, TryRecvError> {
        self.rx.try_recv()
    }

    /// Stop accepting samples. Buffered samples can still be received.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

/// Collector lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    /// Publishers may still be live
    Collecting,
    /// Every publisher completed; the channel is being closed
    Dying,
    /// The collector has released the channel
    Dead,
}

/// Observes collector state from another task
#[derive(Debug, Clone)]
pub struct CollectorWatch {
    rx: watch::Receiver<CollectorState>,
}

impl CollectorWatch {
    /// Current state
    pub fn state(&self) -> CollectorState {
        *self.rx.borrow()
    }

    /// Resolve once the collector is dead
    pub async fn dead(&mut self) {
        // A dropped sender means the collector task is gone, which is dead too.
        let _ = self.rx.wait_for(|s| *s == CollectorState::Dead).await;
    }
}

/// Owns the write side of the sample channel and detects pool completion
#[derive(Debug)]
pub struct Collector {
    tx: mpsc::Sender<Sample>,
    tracker: Arc<CompletionTracker>,
    state: watch::Sender<CollectorState>,
}

impl Collector {
    /// Create a collector and the stream its samples will arrive on
    pub fn new(config: &ChannelConfig) -> (Self, SampleStream) {
        let (tx, rx) = mpsc::channel(config.capacity());
        let (state, _) = watch::channel(CollectorState::Collecting);
        let collector = Self {
            tx,
            tracker: CompletionTracker::new(),
            state,
        };
        (collector, SampleStream::new(rx))
    }

    /// Register a sandbox and return its publisher
    pub fn publisher(&self, worker_id: usize) -> Publisher {
        Publisher {
            worker_id,
            tx: self.tx.clone(),
            _guard: self.tracker.register(),
        }
    }

    /// Subscribe to state changes
    pub fn watch(&self) -> CollectorWatch {
        CollectorWatch {
            rx: self.state.subscribe(),
        }
    }

    /// The shared live-sandbox counter
    pub fn tracker(&self) -> Arc<CompletionTracker> {
        Arc::clone(&self.tracker)
    }

    /// Spawn the completion watcher
    ///
    /// Register every publisher before starting, or the collector may see an
    /// idle pool and close the channel early.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        let Collector { tx, tracker, state } = self;

        tracker.wait_idle().await;
        state.send_replace(CollectorState::Dying);
        tracing::debug!("All sandboxes completed, closing sample channel");

        drop(tx);
        state.send_replace(CollectorState::Dead);
    }
}
