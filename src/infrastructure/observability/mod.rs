//! Push-based observability for the SMC engine
//!
//! This module provides observability through **outbound data only** - no HTTP server,
//! no incoming requests:
//!
//! 1. **Prometheus registry**: rendered in text exposition format on demand
//! 2. **Structured JSON Logs**: one snapshot line per analysis pass

pub mod metrics;
pub mod reporter;

pub use metrics::Metrics;
pub use reporter::{PassReporter, PassSnapshot};
