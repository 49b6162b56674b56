use crate::application::engine::AnalysisReport;
use crate::config::SignalConfig;
use crate::domain::market::KillZone;
use crate::domain::signal::Signal;
use crate::domain::smc::{Bias, MarketStructure, PriceZone};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Confidence before the emission gate, with every contributor's label in
/// evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    pub bias: Bias,
    pub confidence: f64,
    pub reasons: Vec<String>,
}

impl Scorecard {
    fn add(&mut self, points: f64, reason: impl Into<String>) {
        self.confidence += points;
        self.reasons.push(format!("{} (+{})", reason.into(), points));
    }
}

/// Aggregates one pass into at most one signal.
///
/// The weights are additive heuristics, not a calibrated probability; the cap
/// keeps the total below certainty.
pub struct SignalSynthesizer {
    config: SignalConfig,
    min_candles: usize,
}

impl SignalSynthesizer {
    pub fn new(config: SignalConfig, min_candles: usize) -> Self {
        Self {
            config,
            min_candles,
        }
    }

    pub fn active_kill_zone(&self, timestamp_ms: i64) -> Option<&KillZone> {
        KillZone::active_at(&self.config.kill_zones, timestamp_ms)
    }

    /// Scores the pass. `None` when the structure gives no direction.
    pub fn score(&self, report: &AnalysisReport) -> Option<Scorecard> {
        let bias = match report.structure.structure {
            MarketStructure::Uptrend => Bias::Bullish,
            MarketStructure::Downtrend => Bias::Bearish,
            MarketStructure::Ranging => return None,
        };
        let w = &self.config.weights;
        let mut card = Scorecard {
            bias,
            confidence: self.config.base_confidence,
            reasons: Vec::new(),
        };

        card.add(w.trend, format!("{} structure", report.structure.structure));
        if report.structure.trend.is_strong() {
            card.add(w.strong_trend, "Strong trend");
        }

        let favourable = match bias {
            Bias::Bullish => PriceZone::Discount,
            Bias::Bearish => PriceZone::Premium,
        };
        if report
            .premium_discount
            .is_some_and(|pd| pd.current_zone == favourable)
        {
            card.add(w.zone, format!("Price in {} zone", favourable));
        }

        let recent_from = report
            .candle_count
            .saturating_sub(self.config.order_block_recency);
        if report
            .order_blocks
            .iter()
            .any(|ob| ob.kind == bias && !ob.mitigated && ob.index >= recent_from)
        {
            card.add(w.order_block, format!("Unmitigated {} order block", bias));
        }

        if report.fair_value_gaps.iter().any(|gap| !gap.filled) {
            card.add(w.fvg, "Unfilled fair value gap");
        }

        if report.liquidity_sweeps.iter().any(|s| s.bias == bias) {
            card.add(w.sweep, format!("{} liquidity sweep", bias));
        }

        if !report.structure_breaks.is_empty() || !report.changes_of_character.is_empty() {
            card.add(w.structure_break, "Structure break");
        }

        if let Some(zone) = report.last_time.and_then(|t| self.active_kill_zone(t)) {
            card.add(w.kill_zone, format!("{} kill zone", zone.label));
        }

        card.confidence = card.confidence.min(self.config.confidence_cap);
        Some(card)
    }

    /// Applies the data and confidence gates to a scorecard and derives levels.
    pub fn emit(&self, report: &AnalysisReport, card: &Scorecard) -> Option<Signal> {
        if report.candle_count < self.min_candles {
            debug!(
                "Synthesizer: {} has {} candles, need {}",
                report.symbol, report.candle_count, self.min_candles
            );
            return None;
        }
        let (Some(entry), Some(timestamp)) = (report.last_close, report.last_time) else {
            return None;
        };
        let atr = report.atr;
        if !atr.is_finite() || atr <= 0.0 {
            debug!("Synthesizer: {} has no usable ATR ({})", report.symbol, atr);
            return None;
        }
        if card.confidence < self.config.confidence_threshold {
            debug!(
                "Synthesizer: {} {} rejected at {:.0}% (threshold {:.0}%)",
                report.symbol, card.bias, card.confidence, self.config.confidence_threshold
            );
            return None;
        }

        let sign = card.bias.sign();
        let tp1 = entry + sign * self.config.tp1_atr * atr;
        let sl = entry - sign * self.config.sl_atr * atr;

        Some(Signal {
            id: Uuid::new_v4(),
            symbol: report.symbol.clone(),
            bias: card.bias,
            confidence: card.confidence,
            entry,
            tp1,
            tp2: entry + sign * self.config.tp2_atr * atr,
            tp3: entry + sign * self.config.tp3_atr * atr,
            sl,
            risk_reward: (tp1 - entry).abs() / (entry - sl).abs(),
            zone: report.premium_discount.map(|pd| pd.current_zone),
            reasons: card.reasons.clone(),
            timestamp,
        })
    }

    pub fn synthesize(&self, report: &AnalysisReport) -> Option<Signal> {
        let card = self.score(report)?;
        self.emit(report, &card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::smc::{
        FairValueGap, FvgQuality, MarketStructure, OrderBlock, PremiumDiscountZone,
        StructureState, TrendIntensity,
    };

    // 2024-01-02 09:00 UTC, inside the London window
    const LONDON_OPEN: i64 = 1_704_186_000_000;
    // 2024-01-02 20:00 UTC
    const EVENING: i64 = 1_704_225_600_000;

    fn synthesizer() -> SignalSynthesizer {
        SignalSynthesizer::new(SignalConfig::default(), 50)
    }

    fn uptrend_report(time: i64) -> AnalysisReport {
        AnalysisReport {
            symbol: "XAUUSD".to_string(),
            candle_count: 100,
            last_time: Some(time),
            last_close: Some(2000.0),
            atr: 4.0,
            structure: StructureState {
                structure: MarketStructure::Uptrend,
                trend: TrendIntensity::Bull,
                bullish_score: 5,
                bearish_score: 1,
            },
            ..Default::default()
        }
    }

    fn discount() -> PremiumDiscountZone {
        PremiumDiscountZone {
            high: 2100.0,
            low: 1950.0,
            equilibrium: 2025.0,
            premium_threshold: 2042.7,
            discount_threshold: 2007.3,
            current_zone: PriceZone::Discount,
        }
    }

    #[test]
    fn test_ranging_has_no_score() {
        let mut report = uptrend_report(EVENING);
        report.structure = StructureState::ranging();
        assert!(synthesizer().score(&report).is_none());
    }

    #[test]
    fn test_trend_alone_is_below_gate() {
        let report = uptrend_report(EVENING);
        let card = synthesizer().score(&report).unwrap();
        assert_eq!(card.confidence, 65.0);
        assert_eq!(card.reasons.len(), 1);
        assert!(synthesizer().synthesize(&report).is_none());
    }

    #[test]
    fn test_confirmed_setup_emits_signal() {
        let mut report = uptrend_report(LONDON_OPEN);
        report.premium_discount = Some(discount());
        report.order_blocks.push(OrderBlock {
            kind: Bias::Bullish,
            index: 90,
            top: 1998.0,
            bottom: 1994.0,
            time: LONDON_OPEN - 10 * 900_000,
            strength: 80.0,
            mitigated: false,
            touches: 1,
            last_touch_time: None,
        });

        let card = synthesizer().score(&report).unwrap();
        // 50 + 15 trend + 10 zone + 8 order block + 3 kill zone
        assert_eq!(card.confidence, 86.0);
        assert_eq!(card.reasons.len(), 4);
        assert!(card.reasons[3].starts_with("London kill zone"));

        let signal = synthesizer().synthesize(&report).unwrap();
        assert_eq!(signal.bias, Bias::Bullish);
        assert_eq!(signal.entry, 2000.0);
        assert!((signal.tp1 - 2006.0).abs() < 1e-9);
        assert!((signal.tp3 - 2016.0).abs() < 1e-9);
        assert!((signal.sl - 1995.2).abs() < 1e-9);
        assert!((signal.risk_reward - 1.25).abs() < 1e-9);
        assert_eq!(signal.zone, Some(PriceZone::Discount));
        assert_eq!(signal.timestamp, LONDON_OPEN);
    }

    #[test]
    fn test_confidence_is_capped() {
        let mut report = uptrend_report(LONDON_OPEN);
        report.structure.trend = TrendIntensity::StrongBull;
        report.premium_discount = Some(discount());
        report.fair_value_gaps.push(FairValueGap {
            kind: Bias::Bearish,
            index: 95,
            top: 2010.0,
            bottom: 2005.0,
            time: 0,
            filled: false,
            fill_percentage: 10.0,
            quality: FvgQuality::Medium,
            last_fill_time: None,
        });
        report.order_blocks.push(OrderBlock {
            kind: Bias::Bullish,
            index: 95,
            top: 1998.0,
            bottom: 1994.0,
            time: 0,
            strength: 80.0,
            mitigated: false,
            touches: 0,
            last_touch_time: None,
        });
        report.liquidity_sweeps.push(crate::domain::smc::LiquiditySweep {
            kind: crate::domain::smc::LiquidityKind::EqualLows,
            bias: Bias::Bullish,
            zone_price: 1990.0,
            index: 97,
            time: 0,
            extreme: 1988.0,
        });
        report.structure_breaks.push(crate::domain::smc::StructuralBreak {
            kind: Bias::Bullish,
            index: 96,
            break_price: 2001.0,
            new_price: 2003.0,
            time: 0,
        });

        let card = synthesizer().score(&report).unwrap();
        assert_eq!(card.confidence, 98.0);
        assert_eq!(card.reasons.len(), 8);
    }

    #[test]
    fn test_short_window_never_emits() {
        let mut report = uptrend_report(LONDON_OPEN);
        report.premium_discount = Some(discount());
        report.candle_count = 30;
        report.liquidity_sweeps.push(crate::domain::smc::LiquiditySweep {
            kind: crate::domain::smc::LiquidityKind::EqualLows,
            bias: Bias::Bullish,
            zone_price: 1990.0,
            index: 27,
            time: 0,
            extreme: 1988.0,
        });
        assert!(synthesizer().score(&report).unwrap().confidence >= 70.0);
        assert!(synthesizer().synthesize(&report).is_none());
    }
}
