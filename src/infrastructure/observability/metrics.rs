//! Prometheus metrics definitions for the SMC engine
//!
//! All metrics use the `smc_` prefix and are read-only.

use crate::application::engine::AnalysisReport;
use prometheus::{
    Counter, CounterVec, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

/// Prometheus metrics for analysis passes
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Completed analysis passes per symbol
    pub analysis_passes_total: CounterVec,
    /// Emitted signals by symbol and bias
    pub signals_emitted_total: CounterVec,
    /// Scored passes below the confidence gate
    pub signals_rejected_total: CounterVec,
    /// Candles dropped for violating OHLC range invariants
    pub candles_skipped_total: Counter,
    /// Live (unmitigated / unfilled / unswept) structures by kind
    pub live_structures: GaugeVec,
    /// Wall time of one pass
    pub pass_duration_seconds: HistogramVec,
}

impl Metrics {
    /// Create a new Metrics instance with all gauges and counters registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let analysis_passes_total = CounterVec::new(
            Opts::new("smc_analysis_passes_total", "Completed analysis passes"),
            &["symbol"],
        )?;
        registry.register(Box::new(analysis_passes_total.clone()))?;

        let signals_emitted_total = CounterVec::new(
            Opts::new("smc_signals_emitted_total", "Signals that cleared the confidence gate"),
            &["symbol", "bias"],
        )?;
        registry.register(Box::new(signals_emitted_total.clone()))?;

        let signals_rejected_total = CounterVec::new(
            Opts::new(
                "smc_signals_rejected_total",
                "Scored passes below the confidence gate",
            ),
            &["symbol"],
        )?;
        registry.register(Box::new(signals_rejected_total.clone()))?;

        let candles_skipped_total = Counter::with_opts(Opts::new(
            "smc_candles_skipped_total",
            "Candles skipped for violating OHLC range invariants",
        ))?;
        registry.register(Box::new(candles_skipped_total.clone()))?;

        let live_structures = GaugeVec::new(
            Opts::new("smc_live_structures", "Live structural entities by kind"),
            &["symbol", "kind"],
        )?;
        registry.register(Box::new(live_structures.clone()))?;

        let pass_duration_seconds = HistogramVec::new(
            HistogramOpts::new("smc_pass_duration_seconds", "Analysis pass duration in seconds")
                .buckets(vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25]),
            &["symbol"],
        )?;
        registry.register(Box::new(pass_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            analysis_passes_total,
            signals_emitted_total,
            signals_rejected_total,
            candles_skipped_total,
            live_structures,
            pass_duration_seconds,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn encode_text(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    /// Records the outcome of one pass
    pub fn record_pass(&self, report: &AnalysisReport, elapsed: Duration) {
        let symbol = report.symbol.as_str();
        self.analysis_passes_total.with_label_values(&[symbol]).inc();
        self.pass_duration_seconds
            .with_label_values(&[symbol])
            .observe(elapsed.as_secs_f64());
        self.candles_skipped_total
            .inc_by(report.skipped_candles as f64);

        for (kind, count) in report.live_structure_counts() {
            self.live_structures
                .with_label_values(&[symbol, kind])
                .set(count as f64);
        }

        if let Some(signal) = &report.signal {
            let bias = signal.bias.to_string();
            self.signals_emitted_total
                .with_label_values(&[symbol, bias.as_str()])
                .inc();
        } else if report.is_rejected() {
            self.signals_rejected_total.with_label_values(&[symbol]).inc();
        }
    }
}
