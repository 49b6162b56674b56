use crate::domain::market::{Candle, Timeframe};
use tracing::warn;

/// Candles kept for analysis and how many were dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedCandles {
    pub candles: Vec<Candle>,
    /// Position of each kept candle in the input slice.
    pub positions: Vec<usize>,
    pub skipped: usize,
}

/// Gap between two consecutive candles larger than one timeframe step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandleGap {
    pub after_time: i64,
    pub before_time: i64,
    pub missing_bars: i64,
}

/// Per-candle range invariants checked before a pass.
///
/// A violation skips the candle, never the whole pass.
pub struct CandleValidator;

impl CandleValidator {
    /// Validates a single candle.
    pub fn validate_candle(symbol: &str, candle: &Candle) -> bool {
        if !candle.is_well_formed() {
            warn!(
                "Validation FAILED: Candle for {} at {} violates OHLC range (o={} h={} l={} c={})",
                symbol, candle.time, candle.open, candle.high, candle.low, candle.close
            );
            return false;
        }
        true
    }

    /// Keeps well-formed candles in their original order.
    pub fn filter(symbol: &str, candles: &[Candle]) -> ValidatedCandles {
        let mut result = ValidatedCandles {
            candles: Vec::with_capacity(candles.len()),
            positions: Vec::with_capacity(candles.len()),
            skipped: 0,
        };
        for (position, candle) in candles.iter().enumerate() {
            if Self::validate_candle(symbol, candle) {
                result.candles.push(*candle);
                result.positions.push(position);
            } else {
                result.skipped += 1;
            }
        }
        result
    }

    /// Reports holes in the series. Gaps degrade swing and ATR quality but are
    /// not rejected.
    pub fn find_gaps(symbol: &str, candles: &[Candle], timeframe: Timeframe) -> Vec<CandleGap> {
        let gaps: Vec<CandleGap> = candles
            .windows(2)
            .filter_map(|pair| {
                let missing = timeframe.missing_bars(pair[0].time, pair[1].time);
                (missing > 0).then_some(CandleGap {
                    after_time: pair[0].time,
                    before_time: pair[1].time,
                    missing_bars: missing,
                })
            })
            .collect();

        if !gaps.is_empty() {
            let total: i64 = gaps.iter().map(|g| g.missing_bars).sum();
            warn!(
                "Data gap: {} has {} gap(s), {} missing {} bar(s)",
                symbol,
                gaps.len(),
                total,
                timeframe
            );
        }
        gaps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: i64 = 60_000;

    #[test]
    fn test_validate_candle_invalid_low_high() {
        let candle = Candle::new(0, 2000.0, 2000.0, 2001.0, 2000.0);
        assert!(!CandleValidator::validate_candle("XAUUSD", &candle));
    }

    #[test]
    fn test_filter_skips_only_bad_candles() {
        let candles = vec![
            Candle::new(0, 100.0, 101.0, 99.0, 100.5),
            Candle::new(MINUTE, 100.0, 99.0, 98.0, 100.5), // close above high
            Candle::new(2 * MINUTE, 100.0, f64::NAN, 99.0, 100.0),
            Candle::new(3 * MINUTE, 100.5, 102.0, 100.0, 101.5),
        ];
        let result = CandleValidator::filter("XAUUSD", &candles);
        assert_eq!(result.skipped, 2);
        assert_eq!(result.candles.len(), 2);
        assert_eq!(result.candles[1].time, 3 * MINUTE);
        assert_eq!(result.positions, vec![0, 3]);
    }

    #[test]
    fn test_find_gaps() {
        let candles: Vec<Candle> = [0, 1, 2, 5, 6]
            .iter()
            .map(|m| Candle::new(m * MINUTE, 1.0, 1.0, 1.0, 1.0))
            .collect();
        let gaps = CandleValidator::find_gaps("XAUUSD", &candles, Timeframe::OneMin);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].missing_bars, 2);
        assert_eq!(gaps[0].after_time, 2 * MINUTE);
    }
}
