//! Candle window configuration.

use super::parse_usize;
use crate::domain::market::Timeframe;
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::env;

/// Candle window configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Sliding window size; the oldest candle is evicted beyond this.
    pub max_candles: usize,
    /// Below this many candles a pass produces no signal.
    pub min_candles: usize,
    pub timeframe: Timeframe,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_candles: 500,
            min_candles: 50,
            timeframe: Timeframe::FifteenMin,
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        let timeframe = env::var("SMC_TIMEFRAME")
            .unwrap_or_else(|_| d.timeframe.to_string())
            .parse::<Timeframe>()
            .context("Failed to parse SMC_TIMEFRAME")?;

        Ok(Self {
            max_candles: parse_usize("SMC_MAX_CANDLES", d.max_candles)?,
            min_candles: parse_usize("SMC_MIN_CANDLES", d.min_candles)?,
            timeframe,
        })
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.min_candles >= 1, "min_candles must be at least 1");
        ensure!(
            self.max_candles >= self.min_candles,
            "max_candles ({}) must be >= min_candles ({})",
            self.max_candles,
            self.min_candles
        );
        Ok(())
    }
}
