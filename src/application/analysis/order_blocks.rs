use crate::config::DetectionConfig;
use crate::domain::market::Candle;
use crate::domain::smc::{Bias, OrderBlock};

/// Finds origin candles of impulsive moves.
///
/// A bullish block is a bearish candle with a body of at least
/// `order_block_min_body_atr * atr`, followed by a bullish candle whose body is
/// `order_block_impulse_multiplier` times larger and which closes above the
/// origin's high. Bearish blocks mirror this. Blocks closer than
/// `order_block_dedup_distance` candles to an earlier block of the same kind are
/// dropped.
pub fn detect_order_blocks(candles: &[Candle], atr: f64, config: &DetectionConfig) -> Vec<OrderBlock> {
    let mut blocks: Vec<OrderBlock> = Vec::new();
    if candles.len() < 3 {
        return blocks;
    }

    let min_body = config.order_block_min_body_atr * atr;
    for i in 1..candles.len() - 1 {
        let curr = &candles[i];
        let next = &candles[i + 1];

        let kind = if curr.is_bearish() && next.is_bullish() && next.close > curr.high {
            Bias::Bullish
        } else if curr.is_bullish() && next.is_bearish() && next.close < curr.low {
            Bias::Bearish
        } else {
            continue;
        };

        if curr.body() < min_body
            || next.body() < config.order_block_impulse_multiplier * curr.body()
        {
            continue;
        }

        let strength = block_strength(curr, atr);
        if strength < config.order_block_min_strength {
            continue;
        }

        let duplicate = blocks
            .iter()
            .any(|b| b.kind == kind && i - b.index <= config.order_block_dedup_distance);
        if duplicate {
            continue;
        }

        blocks.push(OrderBlock {
            kind,
            index: i,
            top: curr.high,
            bottom: curr.low,
            time: curr.time,
            strength,
            mitigated: false,
            touches: 0,
            last_touch_time: None,
        });
    }
    blocks
}

/// `50 * body/range + 25 * min(range/atr, 2)`, capped at 100.
pub fn block_strength(candle: &Candle, atr: f64) -> f64 {
    let range = candle.range();
    if range <= 0.0 {
        return 0.0;
    }
    let body_ratio = candle.body() / range;
    let volatility_ratio = if atr > 0.0 { range / atr } else { 0.0 };
    (50.0 * body_ratio + 25.0 * volatility_ratio.min(2.0)).min(100.0)
}
