use crate::domain::market::Candle;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional label shared by zones, events and signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Bias {
    Bullish,
    Bearish,
}

impl Bias {
    pub fn opposite(&self) -> Bias {
        match self {
            Bias::Bullish => Bias::Bearish,
            Bias::Bearish => Bias::Bullish,
        }
    }

    /// +1.0 for bullish, -1.0 for bearish.
    pub fn sign(&self) -> f64 {
        match self {
            Bias::Bullish => 1.0,
            Bias::Bearish => -1.0,
        }
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bias::Bullish => write!(f, "BULLISH"),
            Bias::Bearish => write!(f, "BEARISH"),
        }
    }
}

/// Origin candle of an institutional move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBlock {
    pub kind: Bias,
    pub index: usize,
    pub top: f64,
    pub bottom: f64,
    pub time: i64,
    pub strength: f64,
    pub mitigated: bool,
    pub touches: u32,
    /// Newest candle already counted as a touch.
    pub last_touch_time: Option<i64>,
}

impl OrderBlock {
    /// Counts `candle` as a touch if it trades into the block and was not counted
    /// before. Latches `mitigated` once `touches >= mitigation_touches`.
    pub fn register_touch(&mut self, candle: &Candle, mitigation_touches: u32) -> bool {
        if candle.time <= self.time {
            return false;
        }
        if self.last_touch_time.is_some_and(|t| t >= candle.time) {
            return false;
        }
        if !candle.overlaps(self.bottom, self.top) {
            return false;
        }

        self.touches += 1;
        self.last_touch_time = Some(candle.time);
        if self.touches >= mitigation_touches {
            self.mitigated = true;
        }
        true
    }
}

/// Mitigated order block flipped to the opposite side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breaker {
    pub kind: Bias,
    pub index: usize,
    pub top: f64,
    pub bottom: f64,
    pub time: i64,
    pub origin_kind: Bias,
}

impl Breaker {
    pub fn from_order_block(block: &OrderBlock) -> Self {
        Self {
            kind: block.kind.opposite(),
            index: block.index,
            top: block.top,
            bottom: block.bottom,
            time: block.time,
            origin_kind: block.kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FvgQuality {
    High,
    Medium,
}

/// Three-candle imbalance. `index`/`time` refer to the middle candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairValueGap {
    pub kind: Bias,
    pub index: usize,
    pub top: f64,
    pub bottom: f64,
    pub time: i64,
    pub filled: bool,
    pub fill_percentage: f64,
    pub quality: FvgQuality,
    /// Newest candle already applied to the fill.
    pub last_fill_time: Option<i64>,
}

impl FairValueGap {
    pub fn size(&self) -> f64 {
        self.top - self.bottom
    }

    /// Applies `candle` to the fill. Fill never decreases and `filled` latches.
    ///
    /// Returns true when this candle completed the fill.
    pub fn apply_fill(&mut self, candle: &Candle) -> bool {
        if self.filled || self.last_fill_time.is_some_and(|t| t >= candle.time) {
            return false;
        }
        self.last_fill_time = Some(candle.time);

        let size = self.size();
        let overlap = (self.top.min(candle.high) - self.bottom.max(candle.low)).max(0.0);
        let pct = if size > 0.0 {
            (overlap / size * 100.0).min(100.0)
        } else {
            100.0
        };
        self.fill_percentage = self.fill_percentage.max(pct);

        let closed_through = match self.kind {
            Bias::Bullish => candle.close < self.bottom,
            Bias::Bearish => candle.close > self.top,
        };
        if self.fill_percentage >= 100.0 || closed_through {
            self.fill_percentage = 100.0;
            self.filled = true;
            return true;
        }
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiquidityKind {
    EqualHighs,
    EqualLows,
}

impl LiquidityKind {
    /// Equal highs hold sell-side stops (bearish), equal lows buy-side (bullish).
    pub fn bias(&self) -> Bias {
        match self {
            LiquidityKind::EqualHighs => Bias::Bearish,
            LiquidityKind::EqualLows => Bias::Bullish,
        }
    }
}

/// Cluster of near-equal swing extremes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityZone {
    pub kind: LiquidityKind,
    pub price: f64,
    pub source_indices: [usize; 2],
    pub source_times: [i64; 2],
    pub bias: Bias,
    pub swept: bool,
    pub strength: usize,
}

impl LiquidityZone {
    /// True when `candle` pierced the level and closed back on the origin side.
    pub fn is_swept_by(&self, candle: &Candle) -> bool {
        match self.kind {
            LiquidityKind::EqualHighs => candle.high > self.price && candle.close < self.price,
            LiquidityKind::EqualLows => candle.low < self.price && candle.close > self.price,
        }
    }
}

/// Point-in-time record of a zone being swept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquiditySweep {
    pub kind: LiquidityKind,
    pub bias: Bias,
    pub zone_price: f64,
    pub index: usize,
    pub time: i64,
    pub extreme: f64,
}
