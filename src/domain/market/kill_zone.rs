use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed UTC session window, written as `Label=HH:MM-HH:MM`.
///
/// A window whose end is before its start wraps past midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KillZone {
    pub label: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl KillZone {
    pub fn new(label: impl Into<String>, start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            label: label.into(),
            start,
            end,
        }
    }

    /// London and New York opens.
    pub fn defaults() -> Vec<KillZone> {
        vec![
            KillZone::new("London", hm(8, 0), hm(10, 0)),
            KillZone::new("NewYork", hm(13, 0), hm(15, 0)),
        ]
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            time >= self.start && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }

    pub fn contains_millis(&self, timestamp_ms: i64) -> bool {
        DateTime::from_timestamp_millis(timestamp_ms)
            .map(|dt| self.contains(dt.time()))
            .unwrap_or(false)
    }

    /// First zone that is active at `timestamp_ms`.
    pub fn active_at(zones: &[KillZone], timestamp_ms: i64) -> Option<&KillZone> {
        zones.iter().find(|z| z.contains_millis(timestamp_ms))
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

impl FromStr for KillZone {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (label, window) = s
            .split_once('=')
            .context(format!("Kill zone '{}' must look like Label=HH:MM-HH:MM", s))?;
        let (start, end) = window
            .split_once('-')
            .context(format!("Kill zone '{}' is missing the '-' separator", s))?;

        let label = label.trim();
        if label.is_empty() {
            bail!("Kill zone '{}' has an empty label", s);
        }

        let start = NaiveTime::parse_from_str(start.trim(), "%H:%M")
            .context(format!("Invalid kill zone start in '{}'", s))?;
        let end = NaiveTime::parse_from_str(end.trim(), "%H:%M")
            .context(format!("Invalid kill zone end in '{}'", s))?;
        if start == end {
            bail!("Kill zone '{}' is empty", s);
        }

        Ok(KillZone::new(label, start, end))
    }
}

impl TryFrom<String> for KillZone {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<KillZone> for String {
    fn from(zone: KillZone) -> Self {
        zone.to_string()
    }
}

impl fmt::Display for KillZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={:02}:{:02}-{:02}:{:02}",
            self.label,
            self.start.hour(),
            self.start.minute(),
            self.end.hour(),
            self.end.minute()
        )
    }
}
