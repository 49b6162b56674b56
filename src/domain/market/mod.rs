// Market data domain
pub mod candle;
pub mod candle_store;
pub mod kill_zone;
pub mod timeframe;

pub use candle::Candle;
pub use candle_store::CandleStore;
pub use kill_zone::KillZone;
pub use timeframe::Timeframe;
