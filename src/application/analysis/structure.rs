use crate::domain::market::Candle;
use crate::domain::smc::{MarketStructure, StructureState, SwingPoint, TrendIntensity};

/// Margin by which one side must outscore the other to call a trend.
const TREND_MARGIN: usize = 2;
/// Margin above which the trend is labelled strong.
const STRONG_MARGIN: usize = 4;

/// Classifies the trend from the last `lookback` swing highs and lows.
///
/// Each higher high or higher low scores bullish, each lower high or lower low
/// bearish. Without two swings of each kind the last `lookback + 1` candles are
/// compared pairwise instead (as long as the window could hold a swing at all);
/// that fallback never reports a strong trend.
///
/// The pairwise fallback replaces the plain Ranging/Neutral default on purpose:
/// a window that rises candle after candle without forming swings must still
/// read as an uptrend. Keep it when touching the swing scoring above.
pub fn classify_structure(
    candles: &[Candle],
    swings: &[SwingPoint],
    lookback: usize,
    swing_lookback: usize,
) -> StructureState {
    let recent = |high: bool| -> Vec<f64> {
        let prices: Vec<f64> = swings
            .iter()
            .filter(|s| s.is_high() == high)
            .map(|s| s.price)
            .collect();
        prices[prices.len().saturating_sub(lookback)..].to_vec()
    };
    let highs = recent(true);
    let lows = recent(false);

    if highs.len() >= 2 && lows.len() >= 2 {
        let (bull_h, bear_h) = score_sequence(&highs);
        let (bull_l, bear_l) = score_sequence(&lows);
        return label(bull_h + bull_l, bear_h + bear_l, true);
    }

    if candles.len() < 2 * swing_lookback + 1 {
        return StructureState::ranging();
    }

    let tail = &candles[candles.len().saturating_sub(lookback + 1)..];
    let highs: Vec<f64> = tail.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = tail.iter().map(|c| c.low).collect();
    let (bull_h, bear_h) = score_sequence(&highs);
    let (bull_l, bear_l) = score_sequence(&lows);
    label(bull_h + bull_l, bear_h + bear_l, false)
}

/// (rises, falls) between consecutive prices.
fn score_sequence(prices: &[f64]) -> (usize, usize) {
    prices.windows(2).fold((0, 0), |(up, down), w| {
        if w[1] > w[0] {
            (up + 1, down)
        } else if w[1] < w[0] {
            (up, down + 1)
        } else {
            (up, down)
        }
    })
}

fn label(bullish_score: usize, bearish_score: usize, allow_strong: bool) -> StructureState {
    let (structure, trend) = if bullish_score > bearish_score + TREND_MARGIN {
        let strong = allow_strong && bullish_score - bearish_score > STRONG_MARGIN;
        (
            MarketStructure::Uptrend,
            if strong { TrendIntensity::StrongBull } else { TrendIntensity::Bull },
        )
    } else if bearish_score > bullish_score + TREND_MARGIN {
        let strong = allow_strong && bearish_score - bullish_score > STRONG_MARGIN;
        (
            MarketStructure::Downtrend,
            if strong { TrendIntensity::StrongBear } else { TrendIntensity::Bear },
        )
    } else {
        (MarketStructure::Ranging, TrendIntensity::Neutral)
    };

    StructureState {
        structure,
        trend,
        bullish_score,
        bearish_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::smc::SwingKind;

    fn swing(index: usize, kind: SwingKind, price: f64) -> SwingPoint {
        SwingPoint {
            index,
            kind,
            price,
            time: index as i64,
            strength: 3,
        }
    }

    #[test]
    fn test_staircase_is_strong_uptrend() {
        let mut swings = Vec::new();
        for k in 0..4 {
            swings.push(swing(k * 10, SwingKind::Low, 100.0 + k as f64 * 5.0));
            swings.push(swing(k * 10 + 5, SwingKind::High, 110.0 + k as f64 * 5.0));
        }
        let state = classify_structure(&[], &swings, 6, 5);
        assert_eq!(state.structure, MarketStructure::Uptrend);
        assert_eq!(state.trend, TrendIntensity::StrongBull);
        assert_eq!((state.bullish_score, state.bearish_score), (6, 0));
    }

    #[test]
    fn test_mixed_swings_are_ranging() {
        let swings = vec![
            swing(0, SwingKind::High, 110.0),
            swing(5, SwingKind::Low, 100.0),
            swing(10, SwingKind::High, 112.0),
            swing(15, SwingKind::Low, 98.0),
        ];
        let state = classify_structure(&[], &swings, 6, 5);
        assert_eq!(state.structure, MarketStructure::Ranging);
        assert_eq!(state.trend, TrendIntensity::Neutral);
    }

    #[test]
    fn test_rising_candles_without_swings_read_as_uptrend() {
        let candles: Vec<Candle> = (0..12)
            .map(|i| {
                let base = 100.0 + i as f64;
                Candle::new(i, base, base + 1.0, base - 1.0, base + 0.5)
            })
            .collect();
        let state = classify_structure(&candles, &[], 6, 5);
        assert_eq!(state.structure, MarketStructure::Uptrend);
        assert_eq!(state.trend, TrendIntensity::Bull);
        assert_eq!((state.bullish_score, state.bearish_score), (12, 0));
    }

    #[test]
    fn test_insufficient_data_is_ranging() {
        let state = classify_structure(&[], &[], 6, 5);
        assert_eq!(state, StructureState::ranging());
    }
}
