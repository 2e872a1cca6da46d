//! Sandbox module: one isolated simulated client
//!
//! A Sandbox owns a single Workload instance and runs the loop
//! **work -> time -> publish -> repeat** on its own tokio task until the
//! run's shared deadline passes:
//!
//! 1. `init()` the workload (a failure aborts this sandbox only)
//! 2. Call `work()` and measure its wall time in microseconds
//! 3. Optionally stall, if stall mode is enabled
//! 4. Publish the sample to the collector (waits under backpressure)
//! 5. Repeat until the deadline, then `close()` and signal completion
//!
//! # Example
//!
//! ```ignore
//! use bam_core::sandbox::SandboxBuilder;
//!
//! let sandbox = SandboxBuilder::new(0)
//!     .factory(factory)
//!     .properties(properties)
//!     .publisher(collector.publisher(0))
//!     .deadline(start, duration)
//!     .build()?;
//!
//! let stats = sandbox.start().await??;
//! println!("Completed: {}", stats.completed);
//! ```

mod builder;
mod executor;
mod stall;
mod stats;

pub use builder::SandboxBuilder;
pub use executor::Sandbox;
pub use stall::{StallPolicy, DEFAULT_STALL_PAUSE, MIN_OPS_PER_STALL, OPS_PER_STALL_PROPERTY};
pub use stats::SandboxStats;
