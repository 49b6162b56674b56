use crate::application::analysis::{
    fair_value_gaps, indicators, liquidity, market_context, order_blocks, premium_discount,
    reversals, structure, structure_breaks, swings,
};
use crate::application::registry::{RegistryChanges, StructureRegistry};
use crate::application::signal_synthesizer::{Scorecard, SignalSynthesizer};
use crate::config::EngineConfig;
use crate::domain::market::Candle;
use crate::domain::signal::Signal;
use crate::domain::smc::{
    Breaker, ChangeOfCharacter, FairValueGap, InducementZone, LiquiditySweep, LiquidityZone,
    MarketPhase, OptimalTradeEntry, OrderBlock, OrderFlow, PremiumDiscountZone, Reversal,
    StructuralBreak, StructureState, SwingPoint,
};
use crate::domain::validation::CandleValidator;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Everything one pass derived, plus the signal if one cleared the gate.
///
/// This is a read-only projection for renderers and sinks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub candle_count: usize,
    pub skipped_candles: usize,
    pub last_time: Option<i64>,
    pub last_close: Option<f64>,
    pub atr: f64,
    pub swings: Vec<SwingPoint>,
    pub structure: StructureState,
    pub premium_discount: Option<PremiumDiscountZone>,
    pub order_blocks: Vec<OrderBlock>,
    pub breakers: Vec<Breaker>,
    pub fair_value_gaps: Vec<FairValueGap>,
    pub liquidity_zones: Vec<LiquidityZone>,
    pub liquidity_sweeps: Vec<LiquiditySweep>,
    pub structure_breaks: Vec<StructuralBreak>,
    pub changes_of_character: Vec<ChangeOfCharacter>,
    pub reversals: Vec<Reversal>,
    pub inducements: Vec<InducementZone>,
    pub order_flow: OrderFlow,
    pub market_phase: Option<MarketPhase>,
    pub optimal_trade_entry: Option<OptimalTradeEntry>,
    pub kill_zone: Option<String>,
    pub score: Option<Scorecard>,
    pub signal: Option<Signal>,
}

impl AnalysisReport {
    /// A scored pass whose confidence did not reach the gate.
    pub fn is_rejected(&self) -> bool {
        self.score.is_some() && self.signal.is_none()
    }

    /// Live entity counts by kind, for metrics and pass snapshots.
    pub fn live_structure_counts(&self) -> [(&'static str, usize); 8] {
        [
            ("swing", self.swings.len()),
            ("order_block", self.order_blocks.iter().filter(|b| !b.mitigated).count()),
            ("breaker", self.breakers.len()),
            ("fair_value_gap", self.fair_value_gaps.iter().filter(|g| !g.filled).count()),
            ("liquidity_zone", self.liquidity_zones.iter().filter(|z| !z.swept).count()),
            ("structure_break", self.structure_breaks.len()),
            ("change_of_character", self.changes_of_character.len()),
            ("reversal", self.reversals.len()),
        ]
    }

    /// Rewrites every candle index through `positions`, the snapshot position of
    /// each analysed candle, so indices address the caller's window even when
    /// malformed candles were skipped.
    fn map_to_snapshot(&mut self, positions: &[usize]) {
        let at = |i: usize| positions.get(i).copied().unwrap_or(i);
        for swing in &mut self.swings {
            swing.index = at(swing.index);
        }
        for block in &mut self.order_blocks {
            block.index = at(block.index);
        }
        for breaker in &mut self.breakers {
            breaker.index = at(breaker.index);
        }
        for gap in &mut self.fair_value_gaps {
            gap.index = at(gap.index);
        }
        for zone in &mut self.liquidity_zones {
            zone.source_indices = zone.source_indices.map(at);
        }
        for sweep in &mut self.liquidity_sweeps {
            sweep.index = at(sweep.index);
        }
        for event in &mut self.structure_breaks {
            event.index = at(event.index);
        }
        for event in &mut self.changes_of_character {
            event.index = at(event.index);
        }
        for reversal in &mut self.reversals {
            reversal.index = at(reversal.index);
            reversal.confirmation_index = at(reversal.confirmation_index);
        }
        for zone in &mut self.inducements {
            zone.index = at(zone.index);
        }
    }
}

/// Runs analysis passes for one symbol.
///
/// Holds the only cross-pass state: the structure registry and the last known
/// premium/discount range. Passes must not overlap; see
/// [`AnalysisService`](crate::application::analysis_service::AnalysisService).
pub struct SmcEngine {
    symbol: String,
    config: EngineConfig,
    registry: StructureRegistry,
    premium_discount: Option<PremiumDiscountZone>,
    synthesizer: SignalSynthesizer,
}

impl SmcEngine {
    pub fn new(symbol: impl Into<String>, config: EngineConfig) -> Self {
        let synthesizer = SignalSynthesizer::new(config.signal.clone(), config.store.min_candles);
        Self {
            symbol: symbol.into(),
            config,
            registry: StructureRegistry::new(),
            premium_discount: None,
            synthesizer,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// One full pass over a snapshot of the candle window.
    ///
    /// Malformed candles are skipped. With fewer candles than a swing needs, every
    /// detector is empty and no signal is produced.
    pub fn analyze(&mut self, snapshot: &[Candle]) -> AnalysisReport {
        let validated = CandleValidator::filter(&self.symbol, snapshot);
        let candles = validated.candles.as_slice();
        let detection = &self.config.detection;

        let mut report = AnalysisReport {
            symbol: self.symbol.clone(),
            candle_count: candles.len(),
            skipped_candles: validated.skipped,
            last_time: candles.last().map(|c| c.time),
            last_close: candles.last().map(|c| c.close),
            ..Default::default()
        };

        let (Some(last_time), Some(close)) = (report.last_time, report.last_close) else {
            return report;
        };
        if candles.len() < 2 * detection.swing_lookback + 1 {
            debug!(
                "Engine: {} has {} candles, swings need {}",
                self.symbol,
                candles.len(),
                2 * detection.swing_lookback + 1
            );
            return report;
        }

        self.registry.begin_pass(candles);
        let mut changes = RegistryChanges::default();

        let true_ranges = indicators::true_ranges(candles);
        report.atr = indicators::average_true_range(candles, detection.atr_period);

        report.swings = swings::detect_swings(candles, detection.swing_lookback, detection.max_swings);
        report.structure = structure::classify_structure(
            candles,
            &report.swings,
            detection.structure_lookback,
            detection.swing_lookback,
        );

        self.premium_discount = premium_discount::compute_premium_discount(
            &report.swings,
            detection.premium_discount_swings,
            close,
        )
        .or_else(|| self.premium_discount.map(|pd| pd.reclassified(close)));
        report.premium_discount = self.premium_discount;

        let detected = order_blocks::detect_order_blocks(candles, report.atr, detection);
        self.registry
            .update_order_blocks(detected, candles, detection, &mut changes);

        let detected = fair_value_gaps::detect_fair_value_gaps(candles, &true_ranges, detection);
        self.registry
            .update_fair_value_gaps(detected, candles, detection, &mut changes);

        let detected = liquidity::detect_liquidity_zones(&report.swings, detection);
        self.registry
            .update_liquidity(detected, candles, detection, &mut changes);

        report.order_blocks = self.registry.order_blocks();
        report.breakers = self.registry.breakers();
        report.fair_value_gaps = self.registry.fair_value_gaps();
        report.liquidity_zones = self.registry.liquidity_zones();
        report.liquidity_sweeps = self.registry.sweeps();

        report.structure_breaks = structure_breaks::detect_structure_breaks(
            &report.swings,
            detection.bos_min_break_pct,
            detection.max_structure_events,
        );
        report.changes_of_character = structure_breaks::detect_changes_of_character(
            &report.swings,
            detection.max_structure_events,
        );
        report.reversals = reversals::detect_reversals(candles, detection);
        report.inducements = reversals::detect_inducements(&report.swings, detection);

        report.order_flow = market_context::order_flow(
            candles,
            detection.order_flow_depth,
            detection.order_flow_dominance,
        );
        report.market_phase = Some(market_context::market_phase(
            report.structure.structure,
            &report.liquidity_zones,
            &report.structure_breaks,
            &report.changes_of_character,
            report.premium_discount.as_ref(),
        ));
        report.optimal_trade_entry = market_context::optimal_trade_entry(&report.swings, close);
        report.kill_zone = self
            .synthesizer
            .active_kill_zone(last_time)
            .map(|zone| zone.label.clone());

        debug!(
            "Engine: {} pass over {} candles | swings {} | OB {} (+{}, {} touches) | FVG {} (+{}, {} filled) | LQ {} (+{}, {} swept) | BOS {} | CHoCH {}",
            self.symbol,
            candles.len(),
            report.swings.len(),
            report.order_blocks.len(),
            changes.new_order_blocks,
            changes.touches,
            report.fair_value_gaps.len(),
            changes.new_fair_value_gaps,
            changes.newly_filled,
            report.liquidity_zones.len(),
            changes.new_liquidity_zones,
            changes.sweeps.len(),
            report.structure_breaks.len(),
            report.changes_of_character.len()
        );

        report.score = self.synthesizer.score(&report);
        report.signal = report
            .score
            .as_ref()
            .and_then(|card| self.synthesizer.emit(&report, card));

        if let Some(signal) = &report.signal {
            info!("Signal: {} | reasons: {}", signal, signal.reasons.join(", "));
        }
        if validated.skipped > 0 {
            report.map_to_snapshot(&validated.positions);
        }
        report
    }
}
