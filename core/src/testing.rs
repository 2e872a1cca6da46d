//! Mock workloads shared by the unit tests

use crate::sample::Outcome;
use crate::traits::{Properties, Workload, WorkloadError, WorkloadFactory};

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Counts lifecycle calls across every instance made by one factory
#[derive(Debug, Default)]
pub(crate) struct Probe {
    pub inits: AtomicUsize,
    pub works: AtomicUsize,
    pub closes: AtomicUsize,
}

impl Probe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Succeeds after a fixed delay (or a bare yield when the delay is zero)
pub(crate) struct FixedLatency {
    latency: Duration,
    probe: Option<Arc<Probe>>,
}

impl FixedLatency {
    pub fn factory(latency: Duration) -> WorkloadFactory {
        Arc::new(move || -> Box<dyn Workload> {
            Box::new(FixedLatency {
                latency,
                probe: None,
            })
        })
    }

    pub fn probed(latency: Duration, probe: Arc<Probe>) -> WorkloadFactory {
        Arc::new(move || -> Box<dyn Workload> {
            Box::new(FixedLatency {
                latency,
                probe: Some(Arc::clone(&probe)),
            })
        })
    }
}

#[async_trait]
impl Workload for FixedLatency {
    fn name(&self) -> &str {
        "fixed-latency"
    }

    async fn init(&mut self, _properties: &Properties) -> Result<(), WorkloadError> {
        if let Some(probe) = &self.probe {
            probe.inits.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn work(&mut self, _started: Instant) -> Result<Outcome, WorkloadError> {
        if let Some(probe) = &self.probe {
            probe.works.fetch_add(1, Ordering::SeqCst);
        }
        if self.latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.latency).await;
        }
        Ok(Outcome::Ok)
    }

    async fn close(&mut self) -> Result<(), WorkloadError> {
        if let Some(probe) = &self.probe {
            probe.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Alternates OK and failed operations, starting with OK
pub(crate) struct Alternating {
    latency: Duration,
    next_ok: bool,
}

impl Alternating {
    pub fn factory(latency: Duration) -> WorkloadFactory {
        Arc::new(move || -> Box<dyn Workload> {
            Box::new(Alternating {
                latency,
                next_ok: true,
            })
        })
    }
}

#[async_trait]
impl Workload for Alternating {
    fn name(&self) -> &str {
        "alternating"
    }

    async fn init(&mut self, _properties: &Properties) -> Result<(), WorkloadError> {
        Ok(())
    }

    async fn work(&mut self, _started: Instant) -> Result<Outcome, WorkloadError> {
        tokio::time::sleep(self.latency).await;
        let ok = self.next_ok;
        self.next_ok = !self.next_ok;
        if ok {
            Ok(Outcome::Ok)
        } else {
            Err(WorkloadError::Operation("simulated failure".into()))
        }
    }
}

/// Refuses to initialize
pub(crate) struct FailingInit {
    probe: Arc<Probe>,
}

impl FailingInit {
    pub fn factory(probe: Arc<Probe>) -> WorkloadFactory {
        Arc::new(move || -> Box<dyn Workload> {
            Box::new(FailingInit {
                probe: Arc::clone(&probe),
            })
        })
    }
}

#[async_trait]
impl Workload for FailingInit {
    fn name(&self) -> &str {
        "failing-init"
    }

    async fn init(&mut self, _properties: &Properties) -> Result<(), WorkloadError> {
        self.probe.inits.fetch_add(1, Ordering::SeqCst);
        Err(WorkloadError::Init("connection refused".into()))
    }

    async fn work(&mut self, _started: Instant) -> Result<Outcome, WorkloadError> {
        self.probe.works.fetch_add(1, Ordering::SeqCst);
        Ok(Outcome::Ok)
    }
}

/// Fails to initialize only for the first instance the factory creates
pub(crate) fn first_instance_fails(latency: Duration) -> WorkloadFactory {
    let created = Arc::new(AtomicUsize::new(0));
    let probe = Probe::new();
    Arc::new(move || -> Box<dyn Workload> {
        if created.fetch_add(1, Ordering::SeqCst) == 0 {
            Box::new(FailingInit {
                probe: Arc::clone(&probe),
            })
        } else {
            Box::new(FixedLatency {
                latency,
                probe: None,
            })
        }
    })
}

/// Works normally but fails to close
pub(crate) struct FailingClose {
    latency: Duration,
    probe: Arc<Probe>,
}

impl FailingClose {
    pub fn factory(latency: Duration, probe: Arc<Probe>) -> WorkloadFactory {
        Arc::new(move || -> Box<dyn Workload> {
            Box::new(FailingClose {
                latency,
                probe: Arc::clone(&probe),
            })
        })
    }
}

#[async_trait]
impl Workload for FailingClose {
    fn name(&self) -> &str {
        "failing-close"
    }

    async fn init(&mut self, _properties: &Properties) -> Result<(), WorkloadError> {
        Ok(())
    }

    async fn work(&mut self, _started: Instant) -> Result<Outcome, WorkloadError> {
        self.probe.works.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        Ok(Outcome::Ok)
    }

    async fn close(&mut self) -> Result<(), WorkloadError> {
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
        Err(WorkloadError::Close("connection reset".into()))
    }
}
