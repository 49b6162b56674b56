use smc_engine::application::analysis::swings::detect_swings;
use smc_engine::application::engine::{AnalysisReport, SmcEngine};
use smc_engine::config::EngineConfig;
use smc_engine::domain::market::Candle;
use smc_engine::domain::smc::{Bias, LiquidityKind, SwingKind};
use std::collections::HashMap;

const BASE_TIME: i64 = 1_704_186_000_000;
const MINUTE: i64 = 60_000;

/// Deterministic pseudo-random walk with wicks and occasional gaps.
fn random_walk(len: usize, seed: u64) -> Vec<Candle> {
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((state >> 33) as f64) / ((1u64 << 31) as f64)
    };

    let mut price = 2000.0;
    (0..len)
        .map(|i| {
            let jump = if next() < 0.08 { (next() - 0.5) * 12.0 } else { 0.0 };
            let open = price + jump;
            let close = open + (next() - 0.5) * 6.0;
            let high = open.max(close) + next() * 2.0;
            let low = open.min(close) - next() * 2.0;
            price = close;
            Candle::new(BASE_TIME + i as i64 * MINUTE, open, high, low, close)
        })
        .collect()
}

/// Up legs of eight candles, down legs of four: higher highs and higher lows.
fn stepped_uptrend(len: usize) -> Vec<Candle> {
    let mut center = 2000.0;
    (0..len)
        .map(|i| {
            let up = i % 12 < 8;
            center += if up { 1.0 } else { -0.8 };
            let dir = if up { 1.0 } else { -1.0 };
            Candle::new(
                BASE_TIME + i as i64 * MINUTE,
                center - 0.3 * dir,
                center + 0.5,
                center - 0.5,
                center + 0.3 * dir,
            )
        })
        .collect()
}

fn passes(candles: &[Candle], from: usize) -> Vec<AnalysisReport> {
    let mut engine = SmcEngine::new("TEST", EngineConfig::default());
    (from..=candles.len())
        .map(|end| engine.analyze(&candles[..end]))
        .collect()
}

fn assert_signal_consistent(report: &AnalysisReport) {
    let Some(signal) = &report.signal else {
        return;
    };
    assert!(signal.confidence >= 70.0, "gate breached: {}", signal.confidence);
    assert!(signal.confidence <= 98.0);
    assert!(!signal.reasons.is_empty());

    let rr = (signal.tp1 - signal.entry).abs() / (signal.entry - signal.sl).abs();
    assert!((signal.risk_reward - rr).abs() < 1e-9);

    match signal.bias {
        Bias::Bullish => {
            assert!(signal.sl < signal.entry);
            assert!(signal.entry < signal.tp1 && signal.tp1 < signal.tp2 && signal.tp2 < signal.tp3);
        }
        Bias::Bearish => {
            assert!(signal.sl > signal.entry);
            assert!(signal.entry > signal.tp1 && signal.tp1 > signal.tp2 && signal.tp2 > signal.tp3);
        }
    }
}

#[test]
fn test_swing_detection_mirror_symmetry() {
    for seed in [1, 7, 42, 1337] {
        let candles = random_walk(200, seed);
        let mirrored: Vec<Candle> = candles
            .iter()
            .map(|c| Candle::new(c.time, -c.open, -c.low, -c.high, -c.close))
            .collect();

        let original = detect_swings(&candles, 5, usize::MAX);
        let flipped = detect_swings(&mirrored, 5, usize::MAX);

        let highs: Vec<_> = original.iter().filter(|s| s.kind == SwingKind::High).collect();
        let lows: Vec<_> = flipped.iter().filter(|s| s.kind == SwingKind::Low).collect();
        assert_eq!(highs.len(), lows.len(), "seed {}", seed);
        for (h, l) in highs.iter().zip(&lows) {
            assert_eq!(h.index, l.index);
            assert_eq!(h.price, -l.price);
            assert_eq!(h.strength, l.strength);
        }
    }
}

#[test]
fn test_long_lived_entities_only_move_forward() {
    for seed in [3, 11, 99] {
        let candles = random_walk(260, seed);
        let mut touches: HashMap<(i64, Bias), (u32, bool)> = HashMap::new();
        let mut fills: HashMap<(i64, Bias), (f64, bool)> = HashMap::new();
        let mut swept: Vec<(LiquidityKind, f64)> = Vec::new();

        for report in passes(&candles, 11) {
            for block in &report.order_blocks {
                let key = (block.time, block.kind);
                if let Some(&(prev_touches, prev_mitigated)) = touches.get(&key) {
                    assert!(block.touches >= prev_touches);
                    assert!(block.mitigated || !prev_mitigated);
                }
                touches.insert(key, (block.touches, block.mitigated));
            }

            for gap in &report.fair_value_gaps {
                let key = (gap.time, gap.kind);
                if let Some(&(prev_fill, prev_filled)) = fills.get(&key) {
                    assert!(gap.fill_percentage >= prev_fill);
                    assert!(gap.filled || !prev_filled);
                }
                fills.insert(key, (gap.fill_percentage, gap.filled));
            }

            for zone in &report.liquidity_zones {
                if swept.contains(&(zone.kind, zone.price)) {
                    assert!(zone.swept, "swept zone at {} was reset", zone.price);
                }
                if zone.swept && !swept.contains(&(zone.kind, zone.price)) {
                    swept.push((zone.kind, zone.price));
                }
            }

            assert_signal_consistent(&report);
        }
    }
}

#[test]
fn test_repeated_pass_does_not_inflate_counters() {
    let candles = random_walk(150, 5);
    let mut engine = SmcEngine::new("TEST", EngineConfig::default());

    let first = engine.analyze(&candles);
    let second = engine.analyze(&candles);

    let count = |r: &AnalysisReport| r.order_blocks.iter().map(|b| b.touches).sum::<u32>();
    assert_eq!(count(&first), count(&second));
    assert_eq!(first.fair_value_gaps, second.fair_value_gaps);
    assert_eq!(first.liquidity_sweeps, second.liquidity_sweeps);
}

#[test]
fn test_sweeps_recorded_once_when_zones_overflow() {
    let mut config = EngineConfig::default();
    config.detection.max_liquidity_zones = 2;
    config.detection.liquidity_tolerance = 0.01;

    for seed in [8, 13, 21] {
        let candles = random_walk(300, seed);
        let mut engine = SmcEngine::new("TEST", config.clone());

        for end in 11..=candles.len() {
            let report = engine.analyze(&candles[..end]);
            let repeat = engine.analyze(&candles[..end]);
            assert_eq!(report.liquidity_sweeps, repeat.liquidity_sweeps);

            let mut keys: Vec<_> = report
                .liquidity_sweeps
                .iter()
                .map(|s| (s.kind, s.zone_price.to_bits(), s.time))
                .collect();
            let total = keys.len();
            keys.sort_by_key(|k| (k.1, k.2));
            keys.dedup();
            assert_eq!(keys.len(), total, "duplicate sweep, seed {}", seed);
        }
    }
}

#[test]
fn test_stepped_uptrend_emits_gated_bullish_signal() {
    let candles = stepped_uptrend(72);
    let mut engine = SmcEngine::new("TEST", EngineConfig::default());

    let report = engine.analyze(&candles);

    let signal = report.signal.as_ref().expect("strong uptrend clears the gate");
    assert_eq!(signal.bias, Bias::Bullish);
    assert!(signal.reasons[0].starts_with("Uptrend structure"));
    assert!(signal.reasons.iter().any(|r| r.starts_with("Strong trend")));
    assert!((signal.risk_reward - 1.5 / 1.2).abs() < 1e-9);
    assert_eq!(signal.entry, candles[71].close);
    assert_signal_consistent(&report);
}

#[test]
fn test_signal_properties_over_random_series() {
    for seed in 20..26 {
        let candles = random_walk(180, seed);
        for report in passes(&candles, 50) {
            assert_signal_consistent(&report);
            if let Some(card) = &report.score
                && card.confidence < 70.0
            {
                assert!(report.signal.is_none());
            }
        }
    }
}

#[test]
fn test_raising_threshold_suppresses_signal() {
    let candles = stepped_uptrend(72);
    let mut config = EngineConfig::default();
    config.signal.confidence_threshold = 95.0;
    let mut engine = SmcEngine::new("TEST", config);

    let report = engine.analyze(&candles);
    assert!(report.score.is_some());
    assert!(report.signal.is_none());
}
