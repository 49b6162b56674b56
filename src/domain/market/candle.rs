use serde::{Deserialize, Serialize};

/// One OHLC bar. `time` is the bar open in unix milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn new(time: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
        }
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    /// True when the bar traded anywhere inside `[bottom, top]`.
    pub fn overlaps(&self, bottom: f64, top: f64) -> bool {
        self.low <= top && self.high >= bottom
    }

    /// Range invariants: `high >= low` and the body sits inside the range.
    pub fn is_well_formed(&self) -> bool {
        let finite = self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite();

        finite
            && self.high >= self.low
            && self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
    }
}

// Lets `ta` indicators consume candles directly.
impl ta::Open for Candle {
    fn open(&self) -> f64 {
        self.open
    }
}

impl ta::High for Candle {
    fn high(&self) -> f64 {
        self.high
    }
}

impl ta::Low for Candle {
    fn low(&self) -> f64 {
        self.low
    }
}

impl ta::Close for Candle {
    fn close(&self) -> f64 {
        self.close
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wicks_and_body() {
        let candle = Candle::new(0, 100.0, 104.0, 97.0, 102.0);
        assert_eq!(candle.body(), 2.0);
        assert_eq!(candle.range(), 7.0);
        assert_eq!(candle.upper_wick(), 2.0);
        assert_eq!(candle.lower_wick(), 3.0);
        assert!(candle.is_bullish());
    }

    #[test]
    fn test_well_formed_rejects_inverted_range() {
        assert!(Candle::new(0, 100.0, 101.0, 99.0, 100.5).is_well_formed());
        assert!(!Candle::new(0, 100.0, 99.0, 101.0, 100.0).is_well_formed());
        // Close above the high
        assert!(!Candle::new(0, 100.0, 101.0, 99.0, 102.0).is_well_formed());
        assert!(!Candle::new(0, f64::NAN, 101.0, 99.0, 100.0).is_well_formed());
    }

    #[test]
    fn test_overlaps() {
        let candle = Candle::new(0, 100.0, 101.0, 99.0, 100.5);
        assert!(candle.overlaps(100.8, 105.0));
        assert!(!candle.overlaps(101.5, 105.0));
    }
}
