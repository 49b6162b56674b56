use crate::domain::market::Candle;
use crate::domain::smc::{SwingKind, SwingPoint};

/// Local extrema with `lookback` candles on both sides.
///
/// A candle is a swing high when its high is strictly above every other high in
/// `[i - lookback, i + lookback]` (mirror for lows). Equal neighbours disqualify
/// it. Only the most recent `max_swings` points are kept, in index order.
pub fn detect_swings(candles: &[Candle], lookback: usize, max_swings: usize) -> Vec<SwingPoint> {
    if lookback == 0 || candles.len() < 2 * lookback + 1 {
        return Vec::new();
    }

    let mut swings = Vec::new();
    for i in lookback..candles.len() - lookback {
        let candle = &candles[i];
        if let Some(strength) = dominance(candles, i, lookback, |c| c.high, |a, b| a > b) {
            swings.push(SwingPoint {
                index: i,
                kind: SwingKind::High,
                price: candle.high,
                time: candle.time,
                strength,
            });
        }
        if let Some(strength) = dominance(candles, i, lookback, |c| c.low, |a, b| a < b) {
            swings.push(SwingPoint {
                index: i,
                kind: SwingKind::Low,
                price: candle.low,
                time: candle.time,
                strength,
            });
        }
    }

    if swings.len() > max_swings {
        swings.drain(..swings.len() - max_swings);
    }
    swings
}

/// How far the extreme at `i` dominates on its weaker side, or `None` if it does
/// not dominate the full lookback on both sides.
fn dominance(
    candles: &[Candle],
    i: usize,
    lookback: usize,
    price: impl Fn(&Candle) -> f64,
    beats: impl Fn(f64, f64) -> bool,
) -> Option<usize> {
    let pivot = price(&candles[i]);

    let left = candles[..i]
        .iter()
        .rev()
        .take_while(|c| beats(pivot, price(c)))
        .count();
    let right = candles[i + 1..]
        .iter()
        .take_while(|c| beats(pivot, price(c)))
        .count();

    (left >= lookback && right >= lookback).then_some(left.min(right))
}

/// Collapses runs of same-kind swings into a strictly alternating sequence,
/// keeping the more extreme point of each run.
pub fn alternating_swings(swings: &[SwingPoint]) -> Vec<SwingPoint> {
    let mut zigzag: Vec<SwingPoint> = Vec::with_capacity(swings.len());
    for swing in swings {
        match zigzag.last_mut() {
            Some(last) if last.kind == swing.kind => {
                let more_extreme = match swing.kind {
                    SwingKind::High => swing.price > last.price,
                    SwingKind::Low => swing.price < last.price,
                };
                if more_extreme {
                    *last = *swing;
                }
            }
            _ => zigzag.push(*swing),
        }
    }
    zigzag
}
