//! Configuration module for the SMC engine.
//!
//! Configuration is loaded from environment variables or from a TOML file and
//! validated once at load time, organized by concern: candle Store, structural
//! Detection, Signal scoring, and Observability.

mod detection_config;
mod observability_config;
mod signal_config;
mod store_config;

pub use detection_config::DetectionConfig;
pub use observability_config::ObservabilityConfig;
pub use signal_config::{ConfidenceWeights, MIN_CONFIDENCE_THRESHOLD, SignalConfig};
pub use store_config::StoreConfig;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub store: StoreConfig,
    pub detection: DetectionConfig,
    pub signal: SignalConfig,
    pub observability: ObservabilityConfig,
}

impl EngineConfig {
    /// Loads and validates configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            store: StoreConfig::from_env().context("Failed to load store config")?,
            detection: DetectionConfig::from_env().context("Failed to load detection config")?,
            signal: SignalConfig::from_env().context("Failed to load signal config")?,
            observability: ObservabilityConfig::from_env()
                .context("Failed to load observability config")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse engine config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content).context(format!("Invalid config file: {}", path.display()))
    }

    /// TOML file when given, environment otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_toml_file(path),
            None => Self::from_env(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.store.validate().context("Invalid store config")?;
        self.detection.validate().context("Invalid detection config")?;
        self.signal.validate().context("Invalid signal config")?;
        Ok(())
    }
}

pub(crate) fn parse_usize(key: &str, default: usize) -> Result<usize> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<usize>()
        .context(format!("Failed to parse {}", key))
}

pub(crate) fn parse_u32(key: &str, default: u32) -> Result<u32> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<u32>()
        .context(format!("Failed to parse {}", key))
}

pub(crate) fn parse_f64(key: &str, default: f64) -> Result<f64> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<f64>()
        .context(format!("Failed to parse {}", key))
}

pub(crate) fn parse_bool(key: &str, default: bool) -> Result<bool> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<bool>()
        .context(format!("Failed to parse {}", key))
}
