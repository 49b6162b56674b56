use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Candle interval of the analysed series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Timeframe {
    OneMin,
    FiveMin,
    FifteenMin,
    OneHour,
    FourHour,
    OneDay,
}

impl Timeframe {
    /// Returns the duration of this timeframe in minutes
    pub fn to_minutes(&self) -> usize {
        match self {
            Timeframe::OneMin => 1,
            Timeframe::FiveMin => 5,
            Timeframe::FifteenMin => 15,
            Timeframe::OneHour => 60,
            Timeframe::FourHour => 240,
            Timeframe::OneDay => 1440,
        }
    }

    /// Returns the duration in milliseconds
    pub fn to_millis(&self) -> i64 {
        (self.to_minutes() * 60 * 1000) as i64
    }

    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::OneMin => "1Min",
            Timeframe::FiveMin => "5Min",
            Timeframe::FifteenMin => "15Min",
            Timeframe::OneHour => "1Hour",
            Timeframe::FourHour => "4Hour",
            Timeframe::OneDay => "1Day",
        }
    }

    /// Number of missing bars between two consecutive candle open times.
    ///
    /// Weekend closes on daily data are not distinguished from outages.
    pub fn missing_bars(&self, previous_ms: i64, next_ms: i64) -> i64 {
        let step = self.to_millis();
        ((next_ms - previous_ms) / step - 1).max(0)
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "1m" | "1min" | "m1" => Ok(Timeframe::OneMin),
            "5m" | "5min" | "m5" => Ok(Timeframe::FiveMin),
            "15m" | "15min" | "m15" => Ok(Timeframe::FifteenMin),
            "1h" | "1hour" | "h1" => Ok(Timeframe::OneHour),
            "4h" | "4hour" | "h4" => Ok(Timeframe::FourHour),
            "1d" | "1day" | "d" => Ok(Timeframe::OneDay),
            _ => Err(anyhow!(
                "Invalid timeframe: '{}'. Valid options: 1Min, 5Min, 15Min, 1Hour, 4Hour, 1Day",
                s
            )),
        }
    }
}

impl TryFrom<String> for Timeframe {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Timeframe> for String {
    fn from(timeframe: Timeframe) -> Self {
        timeframe.label().to_string()
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
