//! Typed lookups in the free-form property map

use bam_core::{Properties, WorkloadError};
use std::fmt::Display;
use std::str::FromStr;

/// Parse `key` from `properties`, falling back to `default` when absent
pub(crate) fn parse_or<T>(properties: &Properties, key: &str, default: T) -> Result<T, WorkloadError>
where
    T: FromStr,
    T::Err: Display,
{
    match properties.get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| WorkloadError::invalid_property(key, format!("{raw:?}: {e}"))),
    }
}
