//! Context reported next to the structures: order flow, market phase and the
//! optimal trade entry band. None of these feed the confidence score.

use super::swings::alternating_swings;
use crate::domain::market::Candle;
use crate::domain::smc::{
    Bias, ChangeOfCharacter, LiquidityZone, MarketPhase, MarketStructure, OptimalTradeEntry,
    OrderFlow, PremiumDiscountZone, PriceZone, StructuralBreak, SwingPoint,
};

const REJECTION_BONUS: f64 = 0.5;
const OTE_SHALLOW: f64 = 0.62;
const OTE_DEEP: f64 = 0.79;

/// Buying versus selling pressure over the last `depth` candles.
///
/// A directional candle adds its body/range ratio to its side, plus a bonus
/// when the opposite wick is more than twice the other (a rejection).
pub fn order_flow(candles: &[Candle], depth: usize, dominance: f64) -> OrderFlow {
    let recent = &candles[candles.len().saturating_sub(depth)..];
    let (mut buying, mut selling) = (0.0, 0.0);

    for candle in recent {
        let range = candle.range();
        if range <= 0.0 {
            continue;
        }
        if candle.is_bullish() {
            buying += candle.body() / range;
            if candle.lower_wick() > candle.upper_wick() * 2.0 {
                buying += REJECTION_BONUS;
            }
        } else if candle.is_bearish() {
            selling += candle.body() / range;
            if candle.upper_wick() > candle.lower_wick() * 2.0 {
                selling += REJECTION_BONUS;
            }
        }
    }

    if buying > selling * dominance {
        OrderFlow::Bullish
    } else if selling > buying * dominance {
        OrderFlow::Bearish
    } else {
        OrderFlow::Neutral
    }
}

/// Phase of the market cycle, checked in priority order.
pub fn market_phase(
    structure: MarketStructure,
    zones: &[LiquidityZone],
    breaks: &[StructuralBreak],
    changes: &[ChangeOfCharacter],
    premium_discount: Option<&PremiumDiscountZone>,
) -> MarketPhase {
    let swept = zones.iter().filter(|z| z.swept).count();
    let ranging = structure == MarketStructure::Ranging;
    let zone = premium_discount.map(|pd| pd.current_zone);

    if swept > 2 && ranging {
        MarketPhase::Manipulation
    } else if changes.len() >= 2 {
        MarketPhase::Distribution
    } else if ranging && breaks.is_empty() {
        MarketPhase::Accumulation
    } else if (structure == MarketStructure::Uptrend && zone == Some(PriceZone::Discount))
        || (structure == MarketStructure::Downtrend && zone == Some(PriceZone::Premium))
    {
        MarketPhase::Retracement
    } else {
        MarketPhase::Expansion
    }
}

/// 62-79% retracement band of the most recent swing leg.
pub fn optimal_trade_entry(swings: &[SwingPoint], price: f64) -> Option<OptimalTradeEntry> {
    let zigzag = alternating_swings(swings);
    let [.., start, end] = zigzag.as_slice() else {
        return None;
    };

    let leg = end.price - start.price;
    if leg == 0.0 {
        return None;
    }
    let fib_62 = end.price - leg * OTE_SHALLOW;
    let fib_79 = end.price - leg * OTE_DEEP;
    let (low, high) = (fib_62.min(fib_79), fib_62.max(fib_79));

    Some(OptimalTradeEntry {
        kind: if leg > 0.0 { Bias::Bullish } else { Bias::Bearish },
        leg_start: start.price,
        leg_end: end.price,
        fib_62,
        fib_79,
        in_zone: (low..=high).contains(&price),
    })
}
