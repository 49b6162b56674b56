use crate::application::engine::{AnalysisReport, SmcEngine};
use crate::application::signal_tracker::SignalTracker;
use crate::config::EngineConfig;
use crate::domain::errors::AnalysisError;
use crate::domain::market::{Candle, CandleStore};
use crate::domain::ports::SignalSink;
use crate::domain::signal::{SignalEvent, TrackedSignal};
use crate::infrastructure::observability::{Metrics, PassReporter};
use std::sync::{Arc, Mutex, RwLock, TryLockError};
use std::time::Instant;
use tracing::warn;
use uuid::Uuid;

/// Serializes analysis passes over a shared candle store.
///
/// The store is the only state shared with the outside (a feed appends to it
/// while passes read snapshots). A pass requested while another one runs is
/// refused with [`AnalysisError::PassInProgress`] rather than queued.
pub struct AnalysisService {
    store: Arc<RwLock<CandleStore>>,
    engine: Mutex<SmcEngine>,
    sink: Mutex<Box<dyn SignalSink>>,
    tracker: Mutex<SignalTracker>,
    metrics: Option<Metrics>,
    reporter: Option<PassReporter>,
}

impl AnalysisService {
    pub fn new(
        store: Arc<RwLock<CandleStore>>,
        config: EngineConfig,
        sink: Box<dyn SignalSink>,
        metrics: Option<Metrics>,
    ) -> Result<Self, AnalysisError> {
        config.validate().map_err(|e| AnalysisError::Config {
            reason: format!("{:#}", e),
        })?;

        let symbol = store
            .read()
            .map_err(|_| AnalysisError::LockPoisoned {
                resource: "candle store",
            })?
            .symbol()
            .to_string();

        let metrics = if config.observability.metrics_enabled {
            metrics
        } else {
            None
        };
        let reporter = config.observability.report_passes.then_some(PassReporter);

        Ok(Self {
            store,
            engine: Mutex::new(SmcEngine::new(symbol, config)),
            sink: Mutex::new(sink),
            tracker: Mutex::new(SignalTracker::new()),
            metrics,
            reporter,
        })
    }

    pub fn store(&self) -> Arc<RwLock<CandleStore>> {
        Arc::clone(&self.store)
    }

    /// Appends a closed candle to the shared store.
    pub fn ingest(&self, candle: Candle) -> anyhow::Result<()> {
        let mut store = self.store.write().map_err(|_| AnalysisError::LockPoisoned {
            resource: "candle store",
        })?;
        store.push(candle)?;
        Ok(())
    }

    /// Runs one pass over a snapshot of the store.
    ///
    /// Open signals are updated with the newest close, and a new signal is
    /// published to the sink and tracked. Sink failures are logged, not
    /// propagated.
    pub fn run_pass(&self) -> Result<AnalysisReport, AnalysisError> {
        let mut engine = match self.engine.try_lock() {
            Ok(engine) => engine,
            Err(TryLockError::WouldBlock) => {
                return Err(AnalysisError::PassInProgress {
                    symbol: self.symbol()?,
                });
            }
            Err(TryLockError::Poisoned(_)) => {
                return Err(AnalysisError::LockPoisoned { resource: "engine" });
            }
        };

        let snapshot = self
            .store
            .read()
            .map_err(|_| AnalysisError::LockPoisoned {
                resource: "candle store",
            })?
            .snapshot();

        let started = Instant::now();
        let report = engine.analyze(&snapshot);
        let elapsed = started.elapsed();

        {
            let mut tracker = self
                .tracker
                .lock()
                .map_err(|_| AnalysisError::LockPoisoned { resource: "tracker" })?;
            if let Some(close) = report.last_close {
                tracker.update(close);
            }
            if let Some(signal) = &report.signal {
                let mut sink = self
                    .sink
                    .lock()
                    .map_err(|_| AnalysisError::LockPoisoned { resource: "sink" })?;
                if let Err(e) = sink.publish(signal) {
                    warn!("Failed to publish signal {}: {:#}", signal.id, e);
                }
                tracker.track(signal.clone());
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_pass(&report, elapsed);
        }
        if let Some(reporter) = &self.reporter {
            reporter.report(&report);
        }
        Ok(report)
    }

    /// Updates open signals with an intra-candle price.
    pub fn update_price(&self, price: f64) -> Result<Vec<(Uuid, SignalEvent)>, AnalysisError> {
        let mut tracker = self
            .tracker
            .lock()
            .map_err(|_| AnalysisError::LockPoisoned { resource: "tracker" })?;
        Ok(tracker.update(price))
    }

    pub fn tracked_signals(&self) -> Result<Vec<TrackedSignal>, AnalysisError> {
        let tracker = self
            .tracker
            .lock()
            .map_err(|_| AnalysisError::LockPoisoned { resource: "tracker" })?;
        Ok(tracker.all().to_vec())
    }

    pub fn flush(&self) -> anyhow::Result<()> {
        let mut sink = self
            .sink
            .lock()
            .map_err(|_| AnalysisError::LockPoisoned { resource: "sink" })?;
        sink.flush()
    }

    fn symbol(&self) -> Result<String, AnalysisError> {
        Ok(self
            .store
            .read()
            .map_err(|_| AnalysisError::LockPoisoned {
                resource: "candle store",
            })?
            .symbol()
            .to_string())
    }
}
