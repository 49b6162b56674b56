use super::indicators::mean;
use super::swings::alternating_swings;
use crate::config::DetectionConfig;
use crate::domain::market::Candle;
use crate::domain::smc::{Bias, InducementZone, Reversal, SwingPoint};

/// Wick-rejection bars in the last `reversal_scan_depth` candles.
///
/// Bullish: the lower wick covers at least `reversal_wick_ratio` of the range,
/// the candle closes up in the top `reversal_close_position` of its range, and
/// one of the next `reversal_follow_through` candles closes above its high.
/// Bearish mirrors this.
pub fn detect_reversals(candles: &[Candle], config: &DetectionConfig) -> Vec<Reversal> {
    let start = candles.len().saturating_sub(config.reversal_scan_depth);
    let mut reversals = Vec::new();

    for i in start..candles.len() {
        let candle = &candles[i];
        let range = candle.range();
        if range <= 0.0 {
            continue;
        }

        let lower_ratio = candle.lower_wick() / range;
        let upper_ratio = candle.upper_wick() / range;
        let (kind, wick_ratio) = if candle.is_bullish()
            && lower_ratio >= config.reversal_wick_ratio
            && (candle.close - candle.low) / range >= config.reversal_close_position
        {
            (Bias::Bullish, lower_ratio)
        } else if candle.is_bearish()
            && upper_ratio >= config.reversal_wick_ratio
            && (candle.high - candle.close) / range >= config.reversal_close_position
        {
            (Bias::Bearish, upper_ratio)
        } else {
            continue;
        };

        let end = (i + config.reversal_follow_through).min(candles.len() - 1);
        let confirmation = (i + 1..=end).find(|&j| match kind {
            Bias::Bullish => candles[j].close > candle.high,
            Bias::Bearish => candles[j].close < candle.low,
        });

        if let Some(confirmation_index) = confirmation {
            reversals.push(Reversal {
                kind,
                index: i,
                time: candle.time,
                wick_ratio,
                confirmation_index,
            });
        }
    }
    reversals
}

/// Swing-to-swing legs longer than `inducement_amplitude_multiplier` times the
/// mean leg of the alternating swing sequence. The zone sits at the swing the
/// leg started from.
pub fn detect_inducements(swings: &[SwingPoint], config: &DetectionConfig) -> Vec<InducementZone> {
    let zigzag = alternating_swings(swings);
    let amplitudes: Vec<f64> = zigzag
        .windows(2)
        .map(|w| (w[1].price - w[0].price).abs())
        .collect();
    if amplitudes.len() < 3 {
        return Vec::new();
    }
    let Some(average) = mean(&amplitudes).filter(|m| *m > 0.0) else {
        return Vec::new();
    };

    let mut zones: Vec<InducementZone> = zigzag
        .windows(2)
        .zip(&amplitudes)
        .filter(|(_, amp)| **amp > config.inducement_amplitude_multiplier * average)
        .map(|(w, amp)| {
            let origin = &w[0];
            InducementZone {
                kind: if w[1].price > origin.price {
                    Bias::Bullish
                } else {
                    Bias::Bearish
                },
                index: origin.index,
                time: origin.time,
                price: origin.price,
                excursion: *amp,
                amplitude_ratio: amp / average,
            }
        })
        .collect();

    if zones.len() > config.max_structure_events {
        zones.drain(..zones.len() - config.max_structure_events);
    }
    zones
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::smc::SwingKind;

    #[test]
    fn test_hammer_with_follow_through() {
        let candles = vec![
            Candle::new(0, 100.0, 100.5, 99.5, 100.0),
            // Lower wick 9 of range 10, closes at the top
            Candle::new(1, 99.0, 100.0, 90.0, 99.8),
            Candle::new(2, 99.8, 100.4, 99.5, 99.9),
            Candle::new(3, 100.2, 101.5, 100.0, 101.2),
        ];
        let reversals = detect_reversals(&candles, &DetectionConfig::default());
        assert_eq!(reversals.len(), 1);
        assert_eq!(reversals[0].kind, Bias::Bullish);
        assert_eq!(reversals[0].index, 1);
        assert_eq!(reversals[0].confirmation_index, 3);
    }

    #[test]
    fn test_hammer_without_follow_through() {
        let candles = vec![
            Candle::new(0, 100.0, 100.5, 99.5, 100.0),
            Candle::new(1, 99.0, 100.0, 90.0, 99.8),
            Candle::new(2, 99.8, 99.9, 99.0, 99.5),
        ];
        assert!(detect_reversals(&candles, &DetectionConfig::default()).is_empty());
    }

    #[test]
    fn test_outsized_leg_is_inducement() {
        let prices = [100.0, 102.0, 100.0, 102.0, 100.0, 112.0, 110.0];
        let swings: Vec<SwingPoint> = prices
            .iter()
            .enumerate()
            .map(|(i, &price)| SwingPoint {
                index: i * 5,
                kind: if i % 2 == 0 { SwingKind::Low } else { SwingKind::High },
                price,
                time: i as i64,
                strength: 5,
            })
            .collect();

        let zones = detect_inducements(&swings, &DetectionConfig::default());
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].kind, Bias::Bullish);
        assert_eq!(zones[0].price, 100.0);
        assert_eq!(zones[0].index, 20);
    }
}
