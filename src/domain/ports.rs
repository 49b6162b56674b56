use crate::domain::market::{Candle, Timeframe};
use crate::domain::signal::Signal;
use anyhow::Result;

/// Supplies time-ordered candles for one symbol/timeframe.
///
/// Implementations own transport, retries and reconnects; the engine only sees
/// the returned snapshot.
pub trait CandleSource: Send + Sync {
    fn fetch(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<Candle>>;
}

/// Receives signals that cleared the confidence gate.
pub trait SignalSink: Send {
    fn publish(&mut self, signal: &Signal) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
