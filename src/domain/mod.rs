// Candles, the bounded window and session metadata
pub mod market;

// Structural analysis value types (swings, zones, events)
pub mod smc;

// Signal records and their lifecycle
pub mod signal;

// Port interfaces for external collaborators
pub mod ports;

// Candle integrity checks
pub mod validation;

// Domain-specific error types
pub mod errors;
