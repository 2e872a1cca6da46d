//! Workload that does nothing

use async_trait::async_trait;
use bam_core::{Outcome, Properties, Workload, WorkloadError};
use std::time::Instant;

/// Yields to the runtime and reports OK
///
/// Useful for measuring the overhead of the sample pipeline and for
/// exercising stall mode.
#[derive(Debug, Default)]
pub struct NoopWorkload;

#[async_trait]
impl Workload for NoopWorkload {
    fn name(&self) -> &str {
        "noop"
    }

    async fn init(&mut self, _properties: &Properties) -> Result<(), WorkloadError> {
        Ok(())
    }

    async fn work(&mut self, _started: Instant) -> Result<Outcome, WorkloadError> {
        tokio::task::yield_now().await;
        Ok(Outcome::Ok)
    }
}
