//! Built-in synthetic workloads and the name-keyed workload registry
//!
//! This crate provides implementations of the `Workload` trait for:
//!
//! - `sleep`: fixed latency
//! - `jitter`: uniformly distributed latency with optional injected failures
//! - `noop`: returns immediately, measuring the pipeline itself

#![warn(missing_docs)]
#![warn(clippy::all)]

mod jitter;
mod noop;
mod properties;
mod registry;
mod sleep;

pub use jitter::{
    JitterWorkload, DEFAULT_JITTER_MAX_MICROS, DEFAULT_JITTER_MIN_MICROS, JITTER_ERROR_RATE_PROPERTY,
    JITTER_MAX_MICROS_PROPERTY, JITTER_MIN_MICROS_PROPERTY,
};
pub use noop::NoopWorkload;
pub use registry::{RegistryError, WorkloadRegistry};
pub use sleep::{SleepWorkload, DEFAULT_SLEEP_MICROS, SLEEP_MICROS_PROPERTY};
