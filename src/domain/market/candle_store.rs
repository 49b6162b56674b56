use crate::domain::errors::CandleStoreError;
use crate::domain::market::candle::Candle;
use crate::domain::market::timeframe::Timeframe;
use std::collections::VecDeque;

/// Bounded, time-ordered candle window for one symbol/timeframe.
///
/// Appends must be strictly increasing in time. Once `max_len` is exceeded the
/// oldest candle is evicted (FIFO).
#[derive(Debug, Clone)]
pub struct CandleStore {
    symbol: String,
    timeframe: Timeframe,
    max_len: usize,
    candles: VecDeque<Candle>,
}

impl CandleStore {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe, max_len: usize) -> Self {
        let max_len = max_len.max(1);
        Self {
            symbol: symbol.into(),
            timeframe,
            max_len,
            candles: VecDeque::with_capacity(max_len),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn latest(&self) -> Option<&Candle> {
        self.candles.back()
    }

    pub fn push(&mut self, candle: Candle) -> Result<(), CandleStoreError> {
        let finite = [candle.open, candle.high, candle.low, candle.close]
            .iter()
            .all(|p| p.is_finite());
        if !finite {
            return Err(CandleStoreError::InvalidPrice {
                symbol: self.symbol.clone(),
                time: candle.time,
            });
        }

        if let Some(newest) = self.candles.back()
            && candle.time <= newest.time
        {
            return Err(CandleStoreError::OutOfOrder {
                symbol: self.symbol.clone(),
                newest: newest.time,
                received: candle.time,
            });
        }

        self.candles.push_back(candle);
        if self.candles.len() > self.max_len {
            self.candles.pop_front();
        }
        Ok(())
    }

    /// Appends in order, stopping at the first rejected candle.
    pub fn extend<I>(&mut self, candles: I) -> Result<usize, CandleStoreError>
    where
        I: IntoIterator<Item = Candle>,
    {
        let mut appended = 0;
        for candle in candles {
            self.push(candle)?;
            appended += 1;
        }
        Ok(appended)
    }

    /// Immutable copy of the current window for one analysis pass.
    pub fn snapshot(&self) -> Vec<Candle> {
        self.candles.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(time: i64, price: f64) -> Candle {
        Candle::new(time, price, price + 1.0, price - 1.0, price)
    }

    #[test]
    fn test_evicts_oldest_when_full() {
        let mut store = CandleStore::new("XAUUSD", Timeframe::FifteenMin, 3);
        for t in 1..=5 {
            store.push(candle(t, 100.0 + t as f64)).unwrap();
        }

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0].time, 3);
        assert_eq!(store.latest().unwrap().time, 5);
    }

    #[test]
    fn test_rejects_out_of_order_and_duplicates() {
        let mut store = CandleStore::new("XAUUSD", Timeframe::FifteenMin, 10);
        store.push(candle(10, 100.0)).unwrap();

        assert!(matches!(
            store.push(candle(10, 101.0)),
            Err(CandleStoreError::OutOfOrder { .. })
        ));
        assert!(matches!(
            store.push(candle(5, 101.0)),
            Err(CandleStoreError::OutOfOrder { .. })
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_rejects_nan_prices() {
        let mut store = CandleStore::new("XAUUSD", Timeframe::FifteenMin, 10);
        let result = store.push(Candle::new(1, f64::NAN, 1.0, 0.5, 0.8));
        assert!(matches!(result, Err(CandleStoreError::InvalidPrice { .. })));
        assert!(store.is_empty());
    }
}
