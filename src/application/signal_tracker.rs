use crate::domain::signal::{Signal, SignalEvent, SignalStatus, TrackedSignal};
use tracing::info;
use uuid::Uuid;

/// Follows emitted signals against later prices.
#[derive(Debug, Default)]
pub struct SignalTracker {
    signals: Vec<TrackedSignal>,
}

impl SignalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, signal: Signal) {
        self.signals.push(TrackedSignal::new(signal));
    }

    /// Updates every open signal with `price`, returning the transitions.
    pub fn update(&mut self, price: f64) -> Vec<(Uuid, SignalEvent)> {
        let mut transitions = Vec::new();
        for tracked in self.signals.iter_mut().filter(|t| t.status.is_open()) {
            for event in tracked.update(price) {
                info!(
                    "Tracker: {} {} {:?} at {:.5} (status {:?}, pnl {:.5})",
                    tracked.signal.symbol,
                    tracked.signal.bias,
                    event,
                    price,
                    tracked.status,
                    tracked.performance.current_pnl
                );
                transitions.push((tracked.signal.id, event));
            }
        }
        transitions
    }

    pub fn open(&self) -> impl Iterator<Item = &TrackedSignal> {
        self.signals.iter().filter(|t| t.status.is_open())
    }

    pub fn all(&self) -> &[TrackedSignal] {
        &self.signals
    }

    /// Removes and returns signals in a terminal status.
    pub fn drain_closed(&mut self) -> Vec<TrackedSignal> {
        let (closed, open): (Vec<_>, Vec<_>) = std::mem::take(&mut self.signals)
            .into_iter()
            .partition(|t| !t.status.is_open());
        self.signals = open;
        closed
    }

    /// (successes, failures, scratched) among closed signals.
    pub fn outcomes(&self) -> (usize, usize, usize) {
        self.signals.iter().fold((0, 0, 0), |(s, f, b), t| match t.status {
            SignalStatus::Success => (s + 1, f, b),
            SignalStatus::Failure => (s, f + 1, b),
            SignalStatus::Scratched => (s, f, b + 1),
            SignalStatus::Active | SignalStatus::Breakeven => (s, f, b),
        })
    }
}
