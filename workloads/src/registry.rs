//! Name-keyed workload registry

use bam_core::{Workload, WorkloadFactory};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use crate::{JitterWorkload, NoopWorkload, SleepWorkload};

/// Registry lookup errors
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No workload is registered under this name
    #[error("unknown workload {name:?} (available: {available})")]
    UnknownWorkload {
        /// Requested name
        name: String,
        /// Comma-separated registered names
        available: String,
    },

    /// A workload with this name is already registered
    #[error("workload {0:?} is already registered")]
    Duplicate(String),
}

struct Entry {
    description: String,
    factory: WorkloadFactory,
}

/// Maps workload names to factories
///
/// The CLI resolves `--workload NAME` through this registry, so embedding
/// applications can add their own workloads next to the built-in ones.
#[derive(Default)]
pub struct WorkloadRegistry {
    entries: BTreeMap<String, Entry>,
}

impl WorkloadRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `sleep`, `jitter` and `noop`
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        let builtins: [(&str, &str, WorkloadFactory); 3] = [
            (
                "sleep",
                "fixed latency of sleep.micros (default 1000)",
                Arc::new(|| -> Box<dyn Workload> { Box::new(SleepWorkload::new()) }),
            ),
            (
                "jitter",
                "uniform latency in [jitter.min_micros, jitter.max_micros], \
                 failing a jitter.error_rate fraction",
                Arc::new(|| -> Box<dyn Workload> { Box::new(JitterWorkload::new()) }),
            ),
            (
                "noop",
                "returns immediately; measures harness overhead",
                Arc::new(|| -> Box<dyn Workload> { Box::new(NoopWorkload) }),
            ),
        ];

        for (name, description, factory) in builtins {
            registry.entries.insert(
                name.to_string(),
                Entry {
                    description: description.to_string(),
                    factory,
                },
            );
        }
        registry
    }

    /// Add a workload under `name`
    pub fn register(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        factory: WorkloadFactory,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }

        tracing::debug!(workload = %name, "Registered workload");
        self.entries.insert(
            name,
            Entry {
                description: description.into(),
                factory,
            },
        );
        Ok(())
    }

    /// Factory registered under `name`
    pub fn factory(&self, name: &str) -> Result<WorkloadFactory, RegistryError> {
        self.entries
            .get(name)
            .map(|entry| Arc::clone(&entry.factory))
            .ok_or_else(|| RegistryError::UnknownWorkload {
                name: name.to_string(),
                available: self.names().collect::<Vec<_>>().join(", "),
            })
    }

    /// Registered names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// `(name, description)` pairs, sorted by name
    pub fn describe(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.description.as_str()))
    }

    /// Number of registered workloads
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for WorkloadRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkloadRegistry")
            .field("workloads", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
