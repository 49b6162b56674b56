// Structure detectors, one module per analysis step
pub mod analysis;

// Long-lived structures carried between passes
pub mod registry;

// One analysis pass over a candle snapshot
pub mod engine;

// Confidence scoring and signal construction
pub mod signal_synthesizer;

// Lifecycle of emitted signals
pub mod signal_tracker;

// Serialized passes over the shared candle store
pub mod analysis_service;
