//! Random-latency workload with optional injected failures

use async_trait::async_trait;
use bam_core::{Outcome, Properties, Workload, WorkloadError};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

use crate::properties::parse_or;

/// Property holding the smallest latency in microseconds
pub const JITTER_MIN_MICROS_PROPERTY: &str = "jitter.min_micros";

/// Property holding the largest latency in microseconds
pub const JITTER_MAX_MICROS_PROPERTY: &str = "jitter.max_micros";

/// Property holding the fraction of operations that fail
pub const JITTER_ERROR_RATE_PROPERTY: &str = "jitter.error_rate";

/// Default smallest latency
pub const DEFAULT_JITTER_MIN_MICROS: u64 = 500;

/// Default largest latency
pub const DEFAULT_JITTER_MAX_MICROS: u64 = 1500;

/// Sleeps for a uniformly distributed time in `[min, max]` microseconds
///
/// A fraction `jitter.error_rate` of the operations fail after sleeping, so
/// the error path of the harness can be exercised without a real backend.
#[derive(Debug)]
pub struct JitterWorkload {
    latency: Uniform<u64>,
    error_rate: f64,
    rng: StdRng,
}

impl JitterWorkload {
    /// Create a workload with the default range and no failures
    pub fn new() -> Self {
        Self {
            latency: Uniform::new_inclusive(DEFAULT_JITTER_MIN_MICROS, DEFAULT_JITTER_MAX_MICROS),
            error_rate: 0.0,
            rng: StdRng::from_entropy(),
        }
    }

    fn next_delay(&mut self) -> Duration {
        Duration::from_micros(self.latency.sample(&mut self.rng))
    }
}

impl Default for JitterWorkload {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Workload for JitterWorkload {
    fn name(&self) -> &str {
        "jitter"
    }

    async fn init(&mut self, properties: &Properties) -> Result<(), WorkloadError> {
        let min = parse_or(properties, JITTER_MIN_MICROS_PROPERTY, DEFAULT_JITTER_MIN_MICROS)?;
        let max = parse_or(properties, JITTER_MAX_MICROS_PROPERTY, DEFAULT_JITTER_MAX_MICROS)?;
        let error_rate = parse_or(properties, JITTER_ERROR_RATE_PROPERTY, 0.0f64)?;

        if min > max {
            return Err(WorkloadError::invalid_property(
                JITTER_MIN_MICROS_PROPERTY,
                format!("{min} is larger than {JITTER_MAX_MICROS_PROPERTY} ({max})"),
            ));
        }
        if !(0.0..=1.0).contains(&error_rate) {
            return Err(WorkloadError::invalid_property(
                JITTER_ERROR_RATE_PROPERTY,
                format!("must be within [0, 1], got {error_rate}"),
            ));
        }

        self.latency = Uniform::new_inclusive(min, max);
        self.error_rate = error_rate;
        Ok(())
    }

    async fn work(&mut self, _started: Instant) -> Result<Outcome, WorkloadError> {
        let delay = self.next_delay();
        let fail = self.error_rate > 0.0 && self.rng.gen_bool(self.error_rate);

        tokio::time::sleep(delay).await;

        if fail {
            Err(WorkloadError::Operation("injected failure".into()))
        } else {
            Ok(Outcome::Ok)
        }
    }
}
