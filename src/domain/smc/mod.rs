//! Value types produced by the structural analysis pass.
//!
//! Swings, structure labels and break events are recomputed every pass. Order
//! blocks, breakers, fair value gaps and liquidity zones are long-lived and carry
//! the only state mutated across passes (touches, fill, sweep).

pub mod events;
pub mod structure;
pub mod swing;
pub mod zones;

pub use events::{
    ChangeOfCharacter, InducementZone, MarketPhase, OptimalTradeEntry, OrderFlow, Reversal,
    StructuralBreak,
};
pub use structure::{MarketStructure, PremiumDiscountZone, PriceZone, StructureState, TrendIntensity};
pub use swing::{SwingKind, SwingPoint};
pub use zones::{
    Bias, Breaker, FairValueGap, FvgQuality, LiquidityKind, LiquiditySweep, LiquidityZone,
    OrderBlock,
};
