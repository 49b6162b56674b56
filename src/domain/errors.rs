use thiserror::Error;

/// Errors raised when appending to the candle window
#[derive(Debug, Error, PartialEq)]
pub enum CandleStoreError {
    #[error("Out-of-order candle for {symbol}: time {received} <= newest {newest}")]
    OutOfOrder {
        symbol: String,
        newest: i64,
        received: i64,
    },

    #[error("Non-finite price in candle for {symbol} at {time}")]
    InvalidPrice { symbol: String, time: i64 },
}

/// Errors related to running analysis passes
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Analysis pass already running for {symbol}")]
    PassInProgress { symbol: String },

    #[error("Shared {resource} lock poisoned")]
    LockPoisoned { resource: &'static str },

    #[error("Invalid engine configuration: {reason}")]
    Config { reason: String },
}
