//! Per-pass JSON snapshots.
//!
//! Each pass can be summarised as one structured JSON log line, suitable for
//! Loki, Fluentd or CloudWatch ingestion.

use crate::application::engine::AnalysisReport;
use crate::domain::smc::{Bias, MarketPhase, MarketStructure, OrderFlow, PriceZone, TrendIntensity};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Summary of one analysis pass
#[derive(Debug, Serialize)]
pub struct PassSnapshot {
    pub timestamp: String,
    pub version: String,
    pub symbol: String,
    pub candle_time: Option<i64>,
    pub candles: usize,
    pub skipped_candles: usize,
    pub structure: MarketStructure,
    pub trend: TrendIntensity,
    pub zone: Option<PriceZone>,
    pub order_flow: OrderFlow,
    pub phase: Option<MarketPhase>,
    pub live_structures: BTreeMap<&'static str, usize>,
    pub confidence: Option<f64>,
    pub signal: Option<Bias>,
}

impl PassSnapshot {
    pub fn from_report(report: &AnalysisReport) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            symbol: report.symbol.clone(),
            candle_time: report.last_time,
            candles: report.candle_count,
            skipped_candles: report.skipped_candles,
            structure: report.structure.structure,
            trend: report.structure.trend,
            zone: report.premium_discount.map(|pd| pd.current_zone),
            order_flow: report.order_flow,
            phase: report.market_phase,
            live_structures: report.live_structure_counts().into_iter().collect(),
            confidence: report.score.as_ref().map(|s| s.confidence),
            signal: report.signal.as_ref().map(|s| s.bias),
        }
    }
}

/// Logs pass snapshots as JSON at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct PassReporter;

impl PassReporter {
    pub fn report(&self, report: &AnalysisReport) {
        let snapshot = PassSnapshot::from_report(report);
        match serde_json::to_string(&snapshot) {
            Ok(json) => info!("PASS_JSON:{}", json),
            Err(e) => warn!("Failed to serialize pass snapshot: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_serialization() {
        let report = AnalysisReport {
            symbol: "XAUUSD".to_string(),
            candle_count: 120,
            last_time: Some(1_704_186_000_000),
            ..Default::default()
        };
        let snapshot = PassSnapshot::from_report(&report);
        assert_eq!(snapshot.live_structures.get("order_block"), Some(&0));

        let json = serde_json::to_string(&snapshot).expect("Failed to serialize");
        assert!(json.contains("XAUUSD"));
        assert!(json.contains("\"structure\":\"Ranging\""));
        assert!(json.contains("\"signal\":null"));
    }
}
