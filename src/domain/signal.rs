use crate::domain::smc::{Bias, PriceZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Terminal output of an analysis pass. Only emitted above the confidence gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: Uuid,
    pub symbol: String,
    pub bias: Bias,
    pub confidence: f64,
    pub entry: f64,
    pub tp1: f64,
    pub tp2: f64,
    pub tp3: f64,
    pub sl: f64,
    pub risk_reward: f64,
    pub zone: Option<PriceZone>,
    pub reasons: Vec<String>,
    /// Close time of the candle the signal was derived from (unix ms)
    pub timestamp: i64,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} @ {:.2} (conf {:.0}%, sl {:.2}, tp1 {:.2}, rr {:.2})",
            self.symbol, self.bias, self.entry, self.confidence, self.sl, self.tp1, self.risk_reward
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalStatus {
    /// Open, stop at the original level
    Active,
    /// Open, TP2 reached and stop moved to entry
    Breakeven,
    /// TP3 reached
    Success,
    /// Stop loss hit before breakeven was armed
    Failure,
    /// Stopped out at entry after TP2
    Scratched,
}

impl SignalStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, SignalStatus::Active | SignalStatus::Breakeven)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalPerformance {
    pub tp1_hit: bool,
    pub tp2_hit: bool,
    pub tp3_hit: bool,
    pub sl_hit: bool,
    pub breakeven: bool,
    pub current_pnl: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalEvent {
    Tp1Hit,
    Tp2Hit,
    Tp3Hit,
    StopLossHit,
    BreakevenHit,
}

/// Emitted signal followed against later prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedSignal {
    pub signal: Signal,
    pub status: SignalStatus,
    pub performance: SignalPerformance,
}

impl TrackedSignal {
    pub fn new(signal: Signal) -> Self {
        Self {
            signal,
            status: SignalStatus::Active,
            performance: SignalPerformance::default(),
        }
    }

    /// Signed distance from entry in the signal's favour.
    fn favourable(&self, price: f64) -> f64 {
        (price - self.signal.entry) * self.signal.bias.sign()
    }

    /// Updates targets and stops at `price`, returning the transitions it caused.
    pub fn update(&mut self, price: f64) -> Vec<SignalEvent> {
        let mut events = Vec::new();
        if !self.status.is_open() {
            return events;
        }

        let progress = self.favourable(price);
        let reached = |level: f64| progress >= self.favourable(level);
        let (tp1, tp2, tp3) = (reached(self.signal.tp1), reached(self.signal.tp2), reached(self.signal.tp3));

        if tp1 && !self.performance.tp1_hit {
            self.performance.tp1_hit = true;
            self.performance.current_pnl = self.favourable(self.signal.tp1);
            events.push(SignalEvent::Tp1Hit);
        }
        if tp2 && !self.performance.tp2_hit {
            self.performance.tp2_hit = true;
            self.performance.breakeven = true;
            self.performance.current_pnl = self.favourable(self.signal.tp2);
            self.status = SignalStatus::Breakeven;
            events.push(SignalEvent::Tp2Hit);
        }
        if tp3 && !self.performance.tp3_hit {
            self.performance.tp3_hit = true;
            self.performance.current_pnl = self.favourable(self.signal.tp3);
            self.status = SignalStatus::Success;
            events.push(SignalEvent::Tp3Hit);
            return events;
        }

        if !self.performance.breakeven && progress <= self.favourable(self.signal.sl) {
            self.performance.sl_hit = true;
            self.performance.current_pnl = self.favourable(self.signal.sl);
            self.status = SignalStatus::Failure;
            events.push(SignalEvent::StopLossHit);
        } else if self.performance.breakeven && progress <= 0.0 {
            self.performance.current_pnl = 0.0;
            self.status = SignalStatus::Scratched;
            events.push(SignalEvent::BreakevenHit);
        }

        events
    }
}
