use super::zones::Bias;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Break of structure: a swing exceeding the previous swing of the same kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralBreak {
    pub kind: Bias,
    pub index: usize,
    pub break_price: f64,
    pub new_price: f64,
    pub time: i64,
}

/// Change of character: the swing sequence inverts its expected direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeOfCharacter {
    pub kind: Bias,
    pub index: usize,
    pub reversal_price: f64,
    pub new_price: f64,
    pub time: i64,
}

/// Wick-dominant rejection bar confirmed by a follow-through close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reversal {
    pub kind: Bias,
    pub index: usize,
    pub time: i64,
    pub wick_ratio: f64,
    pub confirmation_index: usize,
}

/// Swing-to-swing excursion far above the recent average amplitude.
///
/// `kind` is the direction of the excursion; `price` is the swing it left from,
/// the likely stop-hunt origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InducementZone {
    pub kind: Bias,
    pub index: usize,
    pub time: i64,
    pub price: f64,
    pub excursion: f64,
    pub amplitude_ratio: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderFlow {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl fmt::Display for OrderFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketPhase {
    Accumulation,
    Manipulation,
    Distribution,
    Retracement,
    Expansion,
}

impl fmt::Display for MarketPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 0.62-0.79 retracement band of the latest swing leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalTradeEntry {
    pub kind: Bias,
    pub leg_start: f64,
    pub leg_end: f64,
    pub fib_62: f64,
    pub fib_79: f64,
    pub in_zone: bool,
}
