//! Builder pattern for Sandbox construction

use crate::collector::Publisher;
use crate::error::{BenchError, BenchResult};
use crate::traits::{Properties, WorkloadFactory};

use super::executor::Sandbox;
use super::stall::StallPolicy;

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Builder for creating Sandbox instances
///
/// # Example
/// ```ignore
/// let sandbox = SandboxBuilder::new(0)
///     .factory(factory)
///     .publisher(collector.publisher(0))
///     .deadline(start, Duration::from_secs(10))
///     .build()?;
/// ```
pub struct SandboxBuilder {
    id: usize,
    factory: Option<WorkloadFactory>,
    properties: Option<Arc<Properties>>,
    publisher: Option<Publisher>,
    start: Option<Instant>,
    duration: Option<Duration>,
    stall: StallPolicy,
}

impl SandboxBuilder {
    /// Create a new builder with the given sandbox ID
    pub fn new(id: usize) -> Self {
        Self {
            id,
            factory: None,
            properties: None,
            publisher: None,
            start: None,
            duration: None,
            stall: StallPolicy::disabled(),
        }
    }

    /// Set the workload factory
    pub fn factory(mut self, factory: WorkloadFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Set the workload properties (defaults to empty)
    pub fn properties(mut self, properties: Arc<Properties>) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Set the sample publisher
    pub fn publisher(mut self, publisher: Publisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Set the shared start time and run duration
    pub fn deadline(mut self, start: Instant, duration: Duration) -> Self {
        self.start = Some(start);
        self.duration = Some(duration);
        self
    }

    /// Set the stall policy
    pub fn stall(mut self, stall: StallPolicy) -> Self {
        self.stall = stall;
        self
    }

    /// Build the Sandbox
    ///
    /// # Errors
    /// Returns an error if any required field is missing.
    pub fn build(self) -> BenchResult<Sandbox> {
        let factory = self.factory.ok_or(BenchError::missing_config("factory"))?;
        let publisher = self
            .publisher
            .ok_or(BenchError::missing_config("publisher"))?;
        let start = self.start.ok_or(BenchError::missing_config("start"))?;
        let duration = self
            .duration
            .ok_or(BenchError::missing_config("duration"))?;
        let properties = self.properties.unwrap_or_default();

        Ok(Sandbox::new(
            self.id, factory, properties, start, duration, publisher, self.stall,
        ))
    }
}
