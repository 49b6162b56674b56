use super::indicators::mean;
use crate::config::DetectionConfig;
use crate::domain::market::Candle;
use crate::domain::smc::{Bias, FairValueGap, FvgQuality};

/// Three-candle imbalances large enough to matter.
///
/// `true_ranges` must be aligned with `candles`. A gap qualifies when it exceeds
/// `fvg_min_gap_ratio` times the mean true range of up to `fvg_range_lookback`
/// candles before the pattern; with no prior candles the pattern's own candles
/// are the reference. Gaps larger than the full reference range are `High`
/// quality.
pub fn detect_fair_value_gaps(
    candles: &[Candle],
    true_ranges: &[f64],
    config: &DetectionConfig,
) -> Vec<FairValueGap> {
    let mut gaps = Vec::new();
    if candles.len() < 3 || true_ranges.len() != candles.len() {
        return gaps;
    }

    for i in 2..candles.len() {
        let first = &candles[i - 2];
        let third = &candles[i];

        let (kind, top, bottom) = if third.low > first.high {
            (Bias::Bullish, third.low, first.high)
        } else if third.high < first.low {
            (Bias::Bearish, first.low, third.high)
        } else {
            continue;
        };

        let start = (i - 2).saturating_sub(config.fvg_range_lookback);
        let reference = mean(&true_ranges[start..i - 2])
            .or_else(|| mean(&true_ranges[i - 2..=i]))
            .unwrap_or(0.0);

        let size = top - bottom;
        if size <= config.fvg_min_gap_ratio * reference {
            continue;
        }

        let middle = &candles[i - 1];
        gaps.push(FairValueGap {
            kind,
            index: i - 1,
            top,
            bottom,
            time: middle.time,
            filled: false,
            fill_percentage: 0.0,
            quality: if size > reference {
                FvgQuality::High
            } else {
                FvgQuality::Medium
            },
            last_fill_time: None,
        });
    }
    gaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::analysis::indicators::true_ranges;

    fn series() -> Vec<Candle> {
        let mut candles: Vec<Candle> = (0..10)
            .map(|t| Candle::new(t, 100.0, 101.0, 99.0, 100.0))
            .collect();
        candles.push(Candle::new(10, 100.0, 101.0, 99.5, 100.8));
        candles.push(Candle::new(11, 100.8, 106.0, 100.8, 105.5));
        candles.push(Candle::new(12, 105.5, 107.0, 104.0, 106.0));
        candles
    }

    #[test]
    fn test_bullish_gap_detected_at_middle_candle() {
        let candles = series();
        let gaps = detect_fair_value_gaps(&candles, &true_ranges(&candles), &DetectionConfig::default());
        assert_eq!(gaps.len(), 1);
        let gap = &gaps[0];
        assert_eq!(gap.kind, Bias::Bullish);
        assert_eq!(gap.index, 11);
        assert_eq!((gap.top, gap.bottom), (104.0, 101.0));
        // Reference range is 2.0
        assert_eq!(gap.quality, FvgQuality::High);
    }

    #[test]
    fn test_noise_gap_filtered() {
        let candles = series();
        let config = DetectionConfig {
            fvg_min_gap_ratio: 2.0,
            ..Default::default()
        };
        assert!(detect_fair_value_gaps(&candles, &true_ranges(&candles), &config).is_empty());
    }
}
