//! Master module: lifecycle orchestration and periodic summarization
//!
//! The Master coordinates a complete run:
//! - Spawning one sandbox task per configured worker
//! - Starting the collector that ends the sample stream on pool completion
//! - Driving the calculator from a single task (drain, summarize, snapshot)
//! - Emitting a summary event on every tick and once more at shutdown
//! - Handling external stop requests via a broadcast channel
//!
//! States move `Created → Running → Dying → Dead` and never go back.
//!
//! # Example
//!
//! ```ignore
//! use bam_core::master::MasterBuilder;
//!
//! let (master, mut summaries) = MasterBuilder::new()
//!     .config(config)
//!     .factory(factory)
//!     .build()?;
//!
//! let handle = master.start();
//! while let Some(event) = summaries.recv().await {
//!     println!("{:.0} ops/s", event.ops_per_sec);
//! }
//! let stats = handle.wait().await?;
//! ```

mod aggregator;
mod builder;
mod executor;

pub use aggregator::{aggregate_sandbox_stats, PoolStats};
pub use builder::MasterBuilder;
pub use executor::{Master, MasterHandle, MasterState};
