//! Detector thresholds parsed from environment variables (`SMC_` prefix).
//!
//! Every heuristic constant of the structural detectors lives here so that
//! tests can vary thresholds.

use super::{parse_f64, parse_u32, parse_usize};
use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

/// Detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectionConfig {
    // Swings & structure
    pub swing_lookback: usize,
    pub max_swings: usize,
    pub structure_lookback: usize,
    pub premium_discount_swings: usize,
    pub atr_period: usize,

    // Order blocks
    pub order_block_min_body_atr: f64,
    pub order_block_impulse_multiplier: f64,
    pub order_block_min_strength: f64,
    pub order_block_dedup_distance: usize,
    pub order_block_mitigation_touches: u32,
    pub max_order_blocks: usize,

    // Breakers
    pub breaker_min_touches: u32,
    pub max_breakers: usize,

    // Fair value gaps
    pub fvg_min_gap_ratio: f64,
    pub fvg_range_lookback: usize,
    pub max_fvgs: usize,

    // Liquidity
    pub liquidity_swing_lookback: usize,
    pub liquidity_tolerance: f64,
    pub max_liquidity_zones: usize,

    // BOS / CHoCH
    pub bos_min_break_pct: f64,
    pub max_structure_events: usize,

    // Reversals & inducement
    pub reversal_scan_depth: usize,
    pub reversal_wick_ratio: f64,
    pub reversal_close_position: f64,
    pub reversal_follow_through: usize,
    pub inducement_amplitude_multiplier: f64,

    // Order flow
    pub order_flow_depth: usize,
    pub order_flow_dominance: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            swing_lookback: 5,
            max_swings: 50,
            structure_lookback: 6,
            premium_discount_swings: 10,
            atr_period: 14,
            order_block_min_body_atr: 0.3,
            order_block_impulse_multiplier: 2.0,
            order_block_min_strength: 0.0,
            order_block_dedup_distance: 3,
            order_block_mitigation_touches: 3,
            max_order_blocks: 20,
            breaker_min_touches: 2,
            max_breakers: 15,
            fvg_min_gap_ratio: 0.35,
            fvg_range_lookback: 20,
            max_fvgs: 20,
            liquidity_swing_lookback: 12,
            liquidity_tolerance: 0.004,
            max_liquidity_zones: 10,
            bos_min_break_pct: 0.002,
            max_structure_events: 10,
            reversal_scan_depth: 25,
            reversal_wick_ratio: 0.6,
            reversal_close_position: 0.7,
            reversal_follow_through: 3,
            inducement_amplitude_multiplier: 1.5,
            order_flow_depth: 20,
            order_flow_dominance: 1.3,
        }
    }
}

impl DetectionConfig {
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        Ok(Self {
            swing_lookback: parse_usize("SMC_SWING_LOOKBACK", d.swing_lookback)?,
            max_swings: parse_usize("SMC_MAX_SWINGS", d.max_swings)?,
            structure_lookback: parse_usize("SMC_STRUCTURE_LOOKBACK", d.structure_lookback)?,
            premium_discount_swings: parse_usize(
                "SMC_PREMIUM_DISCOUNT_SWINGS",
                d.premium_discount_swings,
            )?,
            atr_period: parse_usize("SMC_ATR_PERIOD", d.atr_period)?,
            order_block_min_body_atr: parse_f64(
                "SMC_ORDER_BLOCK_MIN_BODY_ATR",
                d.order_block_min_body_atr,
            )?,
            order_block_impulse_multiplier: parse_f64(
                "SMC_ORDER_BLOCK_IMPULSE_MULTIPLIER",
                d.order_block_impulse_multiplier,
            )?,
            order_block_min_strength: parse_f64(
                "SMC_ORDER_BLOCK_MIN_STRENGTH",
                d.order_block_min_strength,
            )?,
            order_block_dedup_distance: parse_usize(
                "SMC_ORDER_BLOCK_DEDUP_DISTANCE",
                d.order_block_dedup_distance,
            )?,
            order_block_mitigation_touches: parse_u32(
                "SMC_ORDER_BLOCK_MITIGATION_TOUCHES",
                d.order_block_mitigation_touches,
            )?,
            max_order_blocks: parse_usize("SMC_MAX_ORDER_BLOCKS", d.max_order_blocks)?,
            breaker_min_touches: parse_u32("SMC_BREAKER_MIN_TOUCHES", d.breaker_min_touches)?,
            max_breakers: parse_usize("SMC_MAX_BREAKERS", d.max_breakers)?,
            fvg_min_gap_ratio: parse_f64("SMC_FVG_MIN_GAP_RATIO", d.fvg_min_gap_ratio)?,
            fvg_range_lookback: parse_usize("SMC_FVG_RANGE_LOOKBACK", d.fvg_range_lookback)?,
            max_fvgs: parse_usize("SMC_MAX_FVGS", d.max_fvgs)?,
            liquidity_swing_lookback: parse_usize(
                "SMC_LIQUIDITY_SWING_LOOKBACK",
                d.liquidity_swing_lookback,
            )?,
            liquidity_tolerance: parse_f64("SMC_LIQUIDITY_TOLERANCE", d.liquidity_tolerance)?,
            max_liquidity_zones: parse_usize("SMC_MAX_LIQUIDITY_ZONES", d.max_liquidity_zones)?,
            bos_min_break_pct: parse_f64("SMC_BOS_MIN_BREAK_PCT", d.bos_min_break_pct)?,
            max_structure_events: parse_usize(
                "SMC_MAX_STRUCTURE_EVENTS",
                d.max_structure_events,
            )?,
            reversal_scan_depth: parse_usize("SMC_REVERSAL_SCAN_DEPTH", d.reversal_scan_depth)?,
            reversal_wick_ratio: parse_f64("SMC_REVERSAL_WICK_RATIO", d.reversal_wick_ratio)?,
            reversal_close_position: parse_f64(
                "SMC_REVERSAL_CLOSE_POSITION",
                d.reversal_close_position,
            )?,
            reversal_follow_through: parse_usize(
                "SMC_REVERSAL_FOLLOW_THROUGH",
                d.reversal_follow_through,
            )?,
            inducement_amplitude_multiplier: parse_f64(
                "SMC_INDUCEMENT_AMPLITUDE_MULTIPLIER",
                d.inducement_amplitude_multiplier,
            )?,
            order_flow_depth: parse_usize("SMC_ORDER_FLOW_DEPTH", d.order_flow_depth)?,
            order_flow_dominance: parse_f64("SMC_ORDER_FLOW_DOMINANCE", d.order_flow_dominance)?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.swing_lookback >= 1, "swing_lookback must be at least 1");
        ensure!(self.max_swings >= 2, "max_swings must be at least 2");
        ensure!(self.structure_lookback >= 2, "structure_lookback must be at least 2");
        ensure!(
            self.premium_discount_swings >= 2,
            "premium_discount_swings must be at least 2"
        );
        ensure!(self.atr_period >= 1, "atr_period must be at least 1");
        ensure!(
            self.order_block_min_body_atr >= 0.0,
            "order_block_min_body_atr must be non-negative"
        );
        ensure!(
            self.order_block_impulse_multiplier > 0.0,
            "order_block_impulse_multiplier must be positive"
        );
        ensure!(
            (0.0..=100.0).contains(&self.order_block_min_strength),
            "order_block_min_strength must be within 0..=100"
        );
        ensure!(
            self.order_block_mitigation_touches >= 1,
            "order_block_mitigation_touches must be at least 1"
        );
        ensure!(
            self.fvg_min_gap_ratio > 0.0,
            "fvg_min_gap_ratio must be positive"
        );
        ensure!(self.fvg_range_lookback >= 1, "fvg_range_lookback must be at least 1");
        ensure!(
            self.liquidity_tolerance > 0.0 && self.liquidity_tolerance < 1.0,
            "liquidity_tolerance must be within (0, 1)"
        );
        ensure!(self.bos_min_break_pct >= 0.0, "bos_min_break_pct must be non-negative");
        ensure!(
            self.reversal_wick_ratio > 0.0 && self.reversal_wick_ratio <= 1.0,
            "reversal_wick_ratio must be within (0, 1]"
        );
        ensure!(
            self.reversal_close_position > 0.0 && self.reversal_close_position <= 1.0,
            "reversal_close_position must be within (0, 1]"
        );
        ensure!(
            self.reversal_follow_through >= 1,
            "reversal_follow_through must be at least 1"
        );
        ensure!(
            self.inducement_amplitude_multiplier > 0.0,
            "inducement_amplitude_multiplier must be positive"
        );
        ensure!(
            self.order_flow_dominance >= 1.0,
            "order_flow_dominance must be at least 1.0"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_config_defaults_are_valid() {
        let config = DetectionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.swing_lookback, 5);
        assert_eq!(config.atr_period, 14);
    }

    #[test]
    fn test_rejects_zero_lookback() {
        let config = DetectionConfig {
            swing_lookback: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
