//! Structural detectors.
//!
//! Each detector is a pure function of the candle window (and of the swings
//! derived from it). Cross-pass state lives in
//! [`StructureRegistry`](crate::application::registry::StructureRegistry).

pub mod fair_value_gaps;
pub mod indicators;
pub mod liquidity;
pub mod market_context;
pub mod order_blocks;
pub mod premium_discount;
pub mod reversals;
pub mod structure;
pub mod structure_breaks;
pub mod swings;
