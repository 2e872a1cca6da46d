//! Fixed-latency workload

use async_trait::async_trait;
use bam_core::{Outcome, Properties, Workload, WorkloadError};
use std::time::{Duration, Instant};

use crate::properties::parse_or;

/// Property holding the sleep length in microseconds
pub const SLEEP_MICROS_PROPERTY: &str = "sleep.micros";

/// Sleep length used when `sleep.micros` is unset
pub const DEFAULT_SLEEP_MICROS: u64 = 1000;

/// Sleeps for a fixed time and reports OK
///
/// With W workers and latency L the pool should sustain W / L operations
/// per second at an efficiency close to 1.0, which makes this the reference
/// workload for checking the harness itself.
#[derive(Debug, Default)]
pub struct SleepWorkload {
    latency: Duration,
}

impl SleepWorkload {
    /// Create an uninitialized sleep workload
    pub fn new() -> Self {
        Self::default()
    }

    /// Configured latency
    pub fn latency(&self) -> Duration {
        self.latency
    }
}

#[async_trait]
impl Workload for SleepWorkload {
    fn name(&self) -> &str {
        "sleep"
    }

    async fn init(&mut self, properties: &Properties) -> Result<(), WorkloadError> {
        let micros = parse_or(properties, SLEEP_MICROS_PROPERTY, DEFAULT_SLEEP_MICROS)?;
        self.latency = Duration::from_micros(micros);
        Ok(())
    }

    async fn work(&mut self, _started: Instant) -> Result<Outcome, WorkloadError> {
        tokio::time::sleep(self.latency).await;
        Ok(Outcome::Ok)
    }
}
