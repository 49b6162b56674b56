use crate::domain::market::Candle;
use statrs::statistics::{Data, Distribution};
use ta::Next;
use ta::indicators::{SimpleMovingAverage, TrueRange};

/// True range of every candle in the window. The first candle has no previous
/// close, so its true range is its high-low range.
pub fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    let mut tr = TrueRange::new();
    candles.iter().map(|c| tr.next(c)).collect()
}

/// Simple average of the last `period` true ranges.
///
/// Windows shorter than `period` average what is available. Returns 0.0 for an
/// empty window or a zero period.
pub fn average_true_range(candles: &[Candle], period: usize) -> f64 {
    let Ok(mut sma) = SimpleMovingAverage::new(period) else {
        return 0.0;
    };
    true_ranges(candles)
        .into_iter()
        .fold(0.0, |_, tr| sma.next(tr))
}

/// Arithmetic mean, `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Data::new(values.to_vec()).mean()
}
