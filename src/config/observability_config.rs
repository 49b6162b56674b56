//! Observability configuration parsing from environment variables.

use super::parse_bool;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Observability configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
    /// Log a JSON snapshot of every pass at info level.
    pub report_passes: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            report_passes: false,
        }
    }
}

impl ObservabilityConfig {
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        Ok(Self {
            metrics_enabled: parse_bool("OBSERVABILITY_METRICS_ENABLED", d.metrics_enabled)?,
            report_passes: parse_bool("OBSERVABILITY_REPORT_PASSES", d.report_passes)?,
        })
    }
}
