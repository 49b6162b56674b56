use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketStructure {
    Uptrend,
    Downtrend,
    Ranging,
}

impl fmt::Display for MarketStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketStructure::Uptrend => write!(f, "Uptrend"),
            MarketStructure::Downtrend => write!(f, "Downtrend"),
            MarketStructure::Ranging => write!(f, "Ranging"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendIntensity {
    StrongBull,
    Bull,
    Neutral,
    Bear,
    StrongBear,
}

impl TrendIntensity {
    pub fn is_strong(&self) -> bool {
        matches!(self, TrendIntensity::StrongBull | TrendIntensity::StrongBear)
    }
}

/// Structure label for one pass, with the scores it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StructureState {
    pub structure: MarketStructure,
    pub trend: TrendIntensity,
    pub bullish_score: usize,
    pub bearish_score: usize,
}

impl StructureState {
    pub fn ranging() -> Self {
        Self {
            structure: MarketStructure::Ranging,
            trend: TrendIntensity::Neutral,
            bullish_score: 0,
            bearish_score: 0,
        }
    }
}

impl Default for StructureState {
    fn default() -> Self {
        Self::ranging()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceZone {
    Premium,
    Discount,
    Equilibrium,
}

impl fmt::Display for PriceZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceZone::Premium => write!(f, "PREMIUM"),
            PriceZone::Discount => write!(f, "DISCOUNT"),
            PriceZone::Equilibrium => write!(f, "EQUILIBRIUM"),
        }
    }
}

/// Fibonacci-style split of the recent swing range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PremiumDiscountZone {
    pub high: f64,
    pub low: f64,
    pub equilibrium: f64,
    pub premium_threshold: f64,
    pub discount_threshold: f64,
    pub current_zone: PriceZone,
}

impl PremiumDiscountZone {
    pub fn classify(&self, price: f64) -> PriceZone {
        if price >= self.premium_threshold {
            PriceZone::Premium
        } else if price <= self.discount_threshold {
            PriceZone::Discount
        } else {
            PriceZone::Equilibrium
        }
    }

    /// Same range, current zone re-evaluated at `price`.
    pub fn reclassified(&self, price: f64) -> Self {
        Self {
            current_zone: self.classify(price),
            ..*self
        }
    }
}
