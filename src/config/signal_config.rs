//! Signal scoring parameters parsed from environment variables (`SIGNAL_` prefix).

use super::parse_f64;
use crate::domain::market::KillZone;
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::env;

/// Hard floor for the emission gate. Lower thresholds are rejected at load time.
pub const MIN_CONFIDENCE_THRESHOLD: f64 = 70.0;

/// Additive confidence contributions, one per confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfidenceWeights {
    pub trend: f64,
    pub strong_trend: f64,
    pub zone: f64,
    pub order_block: f64,
    pub fvg: f64,
    pub sweep: f64,
    pub structure_break: f64,
    pub kill_zone: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            trend: 15.0,
            strong_trend: 5.0,
            zone: 10.0,
            order_block: 8.0,
            fvg: 5.0,
            sweep: 8.0,
            structure_break: 5.0,
            kill_zone: 3.0,
        }
    }
}

/// Signal synthesis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignalConfig {
    pub confidence_threshold: f64,
    pub confidence_cap: f64,
    pub base_confidence: f64,
    pub weights: ConfidenceWeights,
    /// Candles back from the newest within which an order block counts as recent.
    pub order_block_recency: usize,
    pub tp1_atr: f64,
    pub tp2_atr: f64,
    pub tp3_atr: f64,
    pub sl_atr: f64,
    pub kill_zones: Vec<KillZone>,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: MIN_CONFIDENCE_THRESHOLD,
            confidence_cap: 98.0,
            base_confidence: 50.0,
            weights: ConfidenceWeights::default(),
            order_block_recency: 20,
            tp1_atr: 1.5,
            tp2_atr: 2.5,
            tp3_atr: 4.0,
            sl_atr: 1.2,
            kill_zones: KillZone::defaults(),
        }
    }
}

impl SignalConfig {
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        let w = d.weights;

        let kill_zones = match env::var("SIGNAL_KILL_ZONES") {
            Ok(raw) => Self::parse_kill_zones(&raw).context("Failed to parse SIGNAL_KILL_ZONES")?,
            Err(_) => d.kill_zones,
        };

        Ok(Self {
            confidence_threshold: parse_f64(
                "SIGNAL_CONFIDENCE_THRESHOLD",
                d.confidence_threshold,
            )?,
            confidence_cap: parse_f64("SIGNAL_CONFIDENCE_CAP", d.confidence_cap)?,
            base_confidence: parse_f64("SIGNAL_BASE_CONFIDENCE", d.base_confidence)?,
            weights: ConfidenceWeights {
                trend: parse_f64("SIGNAL_WEIGHT_TREND", w.trend)?,
                strong_trend: parse_f64("SIGNAL_WEIGHT_STRONG_TREND", w.strong_trend)?,
                zone: parse_f64("SIGNAL_WEIGHT_ZONE", w.zone)?,
                order_block: parse_f64("SIGNAL_WEIGHT_ORDER_BLOCK", w.order_block)?,
                fvg: parse_f64("SIGNAL_WEIGHT_FVG", w.fvg)?,
                sweep: parse_f64("SIGNAL_WEIGHT_SWEEP", w.sweep)?,
                structure_break: parse_f64("SIGNAL_WEIGHT_STRUCTURE_BREAK", w.structure_break)?,
                kill_zone: parse_f64("SIGNAL_WEIGHT_KILL_ZONE", w.kill_zone)?,
            },
            order_block_recency: super::parse_usize(
                "SIGNAL_ORDER_BLOCK_RECENCY",
                d.order_block_recency,
            )?,
            tp1_atr: parse_f64("SIGNAL_TP1_ATR", d.tp1_atr)?,
            tp2_atr: parse_f64("SIGNAL_TP2_ATR", d.tp2_atr)?,
            tp3_atr: parse_f64("SIGNAL_TP3_ATR", d.tp3_atr)?,
            sl_atr: parse_f64("SIGNAL_SL_ATR", d.sl_atr)?,
            kill_zones,
        })
    }

    /// Comma-separated `Label=HH:MM-HH:MM` list; an empty string disables kill zones.
    pub fn parse_kill_zones(raw: &str) -> Result<Vec<KillZone>> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.confidence_threshold >= MIN_CONFIDENCE_THRESHOLD,
            "confidence_threshold {} is below the minimum of {}",
            self.confidence_threshold,
            MIN_CONFIDENCE_THRESHOLD
        );
        ensure!(
            self.confidence_cap <= 100.0 && self.confidence_cap >= self.confidence_threshold,
            "confidence_cap must be within [confidence_threshold, 100]"
        );
        ensure!(
            (0.0..=self.confidence_cap).contains(&self.base_confidence),
            "base_confidence must be within [0, confidence_cap]"
        );
        ensure!(
            self.tp1_atr > 0.0 && self.tp1_atr < self.tp2_atr && self.tp2_atr < self.tp3_atr,
            "take-profit multipliers must be positive and increasing"
        );
        ensure!(self.sl_atr > 0.0, "sl_atr must be positive");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_config_defaults_are_valid() {
        let config = SignalConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.confidence_threshold, 70.0);
        assert_eq!(config.kill_zones.len(), 2);
    }

    #[test]
    fn test_rejects_threshold_below_gate() {
        let config = SignalConfig {
            confidence_threshold: 65.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_kill_zones() {
        let zones = SignalConfig::parse_kill_zones("Asia=00:00-03:00, London=07:00-10:00").unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].label, "Asia");

        assert!(SignalConfig::parse_kill_zones("").unwrap().is_empty());
        assert!(SignalConfig::parse_kill_zones("Broken=25:00-26:00").is_err());
    }
}
